use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{Config, SettingsError};

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No file existed; the configuration is the default document.
    Missing,
    /// The file was read and parsed.
    File,
    /// The file exists but could not be read or parsed; the configuration
    /// is the default document and the file has not been touched.
    Unreadable,
}

/// Reads the configuration at `path`, falling back to defaults.
///
/// A missing file is the normal first-run case. An unreadable or malformed
/// file is logged and replaced by defaults in memory; it is only overwritten
/// on the next successful save.
pub fn load_config(path: &Path) -> Config {
    read_config(path).0
}

/// Like [`load_config`], but also reports whether the defaults replaced an
/// existing file.
pub fn read_config(path: &Path) -> (Config, ConfigSource) {
    if !path.exists() {
        debug!(path = %path.display(), "no configuration file; using defaults");
        return (Config::default(), ConfigSource::Missing);
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read configuration; using defaults");
            return (Config::default(), ConfigSource::Unreadable);
        }
    };

    match Config::from_json_str(&contents) {
        Ok(config) => {
            debug!(path = %path.display(), presets = config.presets.len(), "loaded configuration");
            (config, ConfigSource::File)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to parse configuration; using defaults");
            (Config::default(), ConfigSource::Unreadable)
        }
    }
}

/// Copies the file at `path` to `<name>.bak` beside it and returns the copy.
pub fn backup_config(path: &Path) -> Result<PathBuf, SettingsError> {
    let backup = sibling_path(path, ".bak");
    fs::copy(path, &backup).map_err(|source| SettingsError::Write {
        path: backup.clone(),
        source,
    })?;
    info!(path = %path.display(), backup = %backup.display(), "backed up configuration");
    Ok(backup)
}

/// Writes `config` to `path` with four-space indentation.
///
/// The document is staged next to the target and renamed into place so a
/// failed write never truncates the existing file.
pub fn save_config(path: &Path, config: &Config) -> Result<(), SettingsError> {
    let serialized = to_pretty_json(config)?;

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| SettingsError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let staging = staging_path(path);
    fs::write(&staging, serialized).map_err(|source| SettingsError::Write {
        path: staging.clone(),
        source,
    })?;

    if let Err(source) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(SettingsError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    debug!(path = %path.display(), "saved configuration");
    Ok(())
}

fn to_pretty_json(config: &Config) -> Result<Vec<u8>, SettingsError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    config.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

fn staging_path(path: &Path) -> PathBuf {
    sibling_path(path, ".tmp")
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "config.json".into());
    name.push(suffix);
    path.with_file_name(name)
}

/// The process-wide configuration service.
///
/// Built once at startup and handed by reference to every component. All
/// mutations are serialized through one lock and only committed to memory
/// after the document reached disk.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: Mutex<Config>,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = load_config(&path);
        info!(path = %path.display(), "opened configuration store");
        Self {
            path,
            current: Mutex::new(config),
        }
    }

    pub fn with_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            current: Mutex::new(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Config {
        self.current.lock().clone()
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let guard = self.current.lock();
        save_config(&self.path, &guard)
    }

    /// Applies `mutate` to a draft, persists it, then commits it.
    ///
    /// If `mutate` fails or the write fails, the in-memory configuration is
    /// left exactly as it was.
    pub fn try_update<R, E, F>(&self, mutate: F) -> Result<R, E>
    where
        F: FnOnce(&mut Config) -> Result<R, E>,
        E: From<SettingsError>,
    {
        let mut guard = self.current.lock();
        let mut draft = guard.clone();
        let result = mutate(&mut draft)?;
        save_config(&self.path, &draft)?;
        *guard = draft;
        Ok(result)
    }

    pub fn update<R>(&self, mutate: impl FnOnce(&mut Config) -> R) -> Result<R, SettingsError> {
        self.try_update(|config| Ok(mutate(config)))
    }

    /// Merges the keys of a partial JSON document into the configuration.
    pub fn update_config(&self, partial: &Value) -> Result<Config, SettingsError> {
        self.try_update(|config| {
            *config = config.merged(partial)?;
            Ok(config.clone())
        })
    }
}
