use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;
use loader::PLUGIN_FILE;

pub const ENV_CONFIG_DIR: &str = "GLFS_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "GLFS_DATA_DIR";
pub const ENV_SHARE_DIR: &str = "GLFS_SHARE_DIR";
const ENV_DEV_ROOT: &str = "GLFS_DEV_ROOT";

const QUALIFIER: &str = "io";
const ORGANISATION: &str = "GLFS";
const APPLICATION: &str = "glfs";

const CONFIG_FILE: &str = "config.json";
const RESOURCES_DIR: &str = "resources";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
    share_dir: PathBuf,
    dev_root: Option<PathBuf>,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;

        let config_dir =
            env_override(ENV_CONFIG_DIR).unwrap_or_else(|| project_dirs.config_dir().to_path_buf());
        let data_dir =
            env_override(ENV_DATA_DIR).unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let share_dir =
            env_override(ENV_SHARE_DIR).unwrap_or_else(|| default_share_dir(&project_dirs));

        Ok(Self {
            config_dir,
            data_dir,
            share_dir,
            dev_root: detect_dev_root(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn share_dir(&self) -> &Path {
        &self.share_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn default_shaders_dir(&self) -> PathBuf {
        self.data_dir.join("shaders")
    }

    /// The MaterialBinLoader plugin shipped with glfs. Falls back to a
    /// source checkout's `resources/` when the share directory lacks it.
    pub fn bundled_plugin(&self) -> PathBuf {
        let installed = self.share_dir.join(RESOURCES_DIR).join(PLUGIN_FILE);
        if installed.is_file() {
            return installed;
        }
        if let Some(dev_root) = &self.dev_root {
            let candidate = dev_root.join(RESOURCES_DIR).join(PLUGIN_FILE);
            if candidate.is_file() {
                return candidate;
            }
        }
        installed
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

fn detect_dev_root() -> Option<PathBuf> {
    if let Some(explicit) = env_override(ENV_DEV_ROOT) {
        return Some(explicit);
    }

    let current = env::current_dir().ok()?;
    current
        .ancestors()
        .find(|dir| dir.join(RESOURCES_DIR).join(PLUGIN_FILE).is_file())
        .map(Path::to_path_buf)
}

#[cfg(target_family = "unix")]
fn default_share_dir(_: &ProjectDirs) -> PathBuf {
    PathBuf::from("/usr/share/glfs")
}

#[cfg(not(target_family = "unix"))]
fn default_share_dir(project_dirs: &ProjectDirs) -> PathBuf {
    project_dirs.data_dir().to_path_buf()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    pub(crate) fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    pub(crate) struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        pub(crate) fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        pub(crate) fn clear(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_overrides_take_precedence() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let config_dir = root.path().join("config");
        let data_dir = root.path().join("data");
        let share_dir = root.path().join("share");

        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, &config_dir);
        let _data_guard = EnvGuard::set(ENV_DATA_DIR, &data_dir);
        let _share_guard = EnvGuard::set(ENV_SHARE_DIR, &share_dir);

        let paths = AppPaths::discover().unwrap();

        assert_eq!(paths.config_dir(), config_dir.as_path());
        assert_eq!(paths.data_dir(), data_dir.as_path());
        assert_eq!(paths.share_dir(), share_dir.as_path());
        assert_eq!(paths.config_file(), config_dir.join("config.json"));
        assert_eq!(paths.default_shaders_dir(), data_dir.join("shaders"));
    }

    #[test]
    fn empty_override_falls_back_to_platform_dirs() {
        let _guard = env_lock().lock().unwrap();
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, Path::new(""));

        let paths = AppPaths::discover().unwrap();
        assert!(!paths.config_dir().as_os_str().is_empty());
    }

    #[test]
    fn bundled_plugin_prefers_share_then_dev_root() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let share_dir = root.path().join("share");
        let dev_root = root.path().join("checkout");
        fs::create_dir_all(dev_root.join(RESOURCES_DIR)).unwrap();
        fs::write(dev_root.join(RESOURCES_DIR).join(PLUGIN_FILE), b"// dev").unwrap();

        let _share_guard = EnvGuard::set(ENV_SHARE_DIR, &share_dir);
        let _dev_guard = EnvGuard::set(ENV_DEV_ROOT, &dev_root);
        let _config_guard = EnvGuard::clear(ENV_CONFIG_DIR);

        let paths = AppPaths::discover().unwrap();
        assert_eq!(
            paths.bundled_plugin(),
            dev_root.join(RESOURCES_DIR).join(PLUGIN_FILE)
        );

        fs::create_dir_all(share_dir.join(RESOURCES_DIR)).unwrap();
        fs::write(share_dir.join(RESOURCES_DIR).join(PLUGIN_FILE), b"// share").unwrap();
        assert_eq!(
            paths.bundled_plugin(),
            share_dir.join(RESOURCES_DIR).join(PLUGIN_FILE)
        );
    }
}
