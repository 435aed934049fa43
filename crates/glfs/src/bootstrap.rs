use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use loader::PathResolver;
use settings::{backup_config, read_config, save_config, Config, ConfigSource, SettingsStore};
use tracing::{debug, info, warn};

use crate::paths::AppPaths;

pub const ENV_NO_DETECT: &str = "GLFS_NO_DETECT";

/// Creates the glfs directories, opens the configuration and fills in any
/// path the user has not set yet.
///
/// Filled paths are persisted right away, except when the existing file
/// could not be loaded: that file is copied to `config.json.bak` and left in
/// place until a command changes the configuration.
pub fn bootstrap_filesystem(paths: &AppPaths) -> Result<SettingsStore> {
    for dir in [
        paths.config_dir().to_path_buf(),
        paths.data_dir().to_path_buf(),
    ] {
        ensure_directory(&dir)?;
    }

    let file = paths.config_file();
    let (mut config, source) = read_config(&file);
    let detect = env::var_os(ENV_NO_DETECT).is_none();
    let changed = fill_missing_paths(&mut config, paths, || {
        if detect {
            PathResolver::new().detect_install_path()
        } else {
            debug!("minecraft path detection disabled via {ENV_NO_DETECT}");
            None
        }
    });

    match source {
        ConfigSource::Unreadable => match backup_config(&file) {
            Ok(backup) => warn!(
                path = %file.display(),
                backup = %backup.display(),
                "configuration unreadable; using defaults until the next change"
            ),
            Err(err) => warn!(
                path = %file.display(),
                error = %err,
                "configuration unreadable and could not be backed up"
            ),
        },
        _ if changed => save_config(&file, &config)
            .with_context(|| format!("failed to persist {}", file.display()))?,
        _ => {}
    }

    let store = SettingsStore::with_config(file, config);

    if let Some(shaders) = store.snapshot().shaders_dir() {
        if shaders == paths.default_shaders_dir() {
            ensure_directory(&shaders)?;
        }
    }

    Ok(store)
}

/// Fills `minecraft_path` from `detect` and `shaders_path` with the default
/// library when either is blank. Returns whether anything changed.
fn fill_missing_paths(
    config: &mut Config,
    paths: &AppPaths,
    detect: impl FnOnce() -> Option<PathBuf>,
) -> bool {
    let mut changed = false;

    if config.minecraft_dir().is_none() {
        if let Some(found) = detect() {
            info!(path = %found.display(), "detected minecraft data directory");
            config.minecraft_path = found.to_string_lossy().into_owned();
            changed = true;
        }
    }

    if config.shaders_dir().is_none() {
        let library = paths.default_shaders_dir();
        debug!(path = %library.display(), "defaulting shader library");
        config.shaders_path = library.to_string_lossy().into_owned();
        changed = true;
    }

    changed
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if path.is_dir() {
            debug!(path = %path.display(), "reusing existing directory");
            Ok(())
        } else {
            bail!("filesystem entry at {} is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create glfs directory at {}", path.display()))?;
        debug!(path = %path.display(), "created glfs directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::tests::{env_lock, EnvGuard};
    use crate::paths::{ENV_CONFIG_DIR, ENV_DATA_DIR, ENV_SHARE_DIR};
    use settings::load_config;
    use tempfile::TempDir;

    fn paths_in(root: &TempDir) -> (AppPaths, [EnvGuard; 4]) {
        let guards = [
            EnvGuard::set(ENV_CONFIG_DIR, &root.path().join("config")),
            EnvGuard::set(ENV_DATA_DIR, &root.path().join("data")),
            EnvGuard::set(ENV_SHARE_DIR, &root.path().join("share")),
            EnvGuard::set(ENV_NO_DETECT, Path::new("1")),
        ];
        (AppPaths::discover().unwrap(), guards)
    }

    #[test]
    fn first_run_creates_directories_and_defaults_library() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let (paths, _guards) = paths_in(&root);

        let store = bootstrap_filesystem(&paths).unwrap();

        assert!(paths.config_dir().is_dir());
        assert!(paths.default_shaders_dir().is_dir());
        let expected = paths.default_shaders_dir().to_string_lossy().into_owned();
        assert_eq!(store.snapshot().shaders_path, expected);
        assert_eq!(load_config(&paths.config_file()).shaders_path, expected);
        assert!(store.snapshot().minecraft_path.is_empty());
    }

    #[test]
    fn configured_paths_are_left_alone() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let (paths, _guards) = paths_in(&root);
        fs::create_dir_all(paths.config_dir()).unwrap();
        fs::write(
            paths.config_file(),
            r#"{"shaders_path": "/srv/shaders", "minecraft_path": "/srv/mojang"}"#,
        )
        .unwrap();
        let before = fs::read_to_string(paths.config_file()).unwrap();

        let store = bootstrap_filesystem(&paths).unwrap();

        assert_eq!(store.snapshot().shaders_path, "/srv/shaders");
        assert_eq!(fs::read_to_string(paths.config_file()).unwrap(), before);
        assert!(!paths.default_shaders_dir().exists());
    }

    #[test]
    fn detected_minecraft_path_is_recorded() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let (paths, _guards) = paths_in(&root);
        let mojang = root.path().join("com.mojang");

        let mut config = Config::default();
        config.shaders_path = "/srv/shaders".into();
        let changed = fill_missing_paths(&mut config, &paths, || Some(mojang.clone()));

        assert!(changed);
        assert_eq!(config.minecraft_path, mojang.to_string_lossy());

        let changed = fill_missing_paths(&mut config, &paths, || panic!("already set"));
        assert!(!changed);
    }

    #[test]
    fn unreadable_config_is_backed_up_and_not_rewritten() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let (paths, _guards) = paths_in(&root);
        fs::create_dir_all(paths.config_dir()).unwrap();
        let broken = r#"{"presets": {"night": "night.hlsl"},}"#;
        fs::write(paths.config_file(), broken).unwrap();

        let store = bootstrap_filesystem(&paths).unwrap();

        assert_eq!(fs::read_to_string(paths.config_file()).unwrap(), broken);
        assert_eq!(
            fs::read_to_string(paths.config_dir().join("config.json.bak")).unwrap(),
            broken
        );
        assert_eq!(
            store.snapshot().shaders_path,
            paths.default_shaders_dir().to_string_lossy()
        );
    }

    #[test]
    fn file_in_place_of_config_dir_is_an_error() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let (paths, _guards) = paths_in(&root);
        fs::write(paths.config_dir(), b"not a directory").unwrap();

        let err = bootstrap_filesystem(&paths).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }
}
