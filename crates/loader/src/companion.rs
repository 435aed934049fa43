//! BetterRenderDragon integration: checks whether the MaterialBinLoader
//! plugin is installed and enabled, and installs it.
//!
//! BRD owns its `config.json`. Only the `plugins` list and the
//! `MaterialBinLoader` block are touched; every other key is written back as
//! it was read.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map, Value};
use settings::Config;
use tracing::{debug, info};

use crate::json::{read_json, write_json};
use crate::locate::expand_path;
use crate::outcome::{Outcome, Status};
use crate::{LoaderError, Result};

pub const PLUGIN_NAME: &str = "MaterialBinLoader";
pub const PLUGIN_FILE: &str = "MaterialBinLoader.js";

const CONFIG_FILE: &str = "config.json";
const PLUGINS_DIR: &str = "plugins";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    Ok,
    Missing,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginStatus {
    pub state: PluginState,
    pub message: String,
}

impl PluginStatus {
    fn new(state: PluginState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

impl From<PluginStatus> for Outcome {
    fn from(status: PluginStatus) -> Self {
        let kind = match status.state {
            PluginState::Ok => Status::Ok,
            PluginState::Missing => Status::Missing,
            PluginState::Disabled => Status::Disabled,
        };
        Outcome::new(kind, status.message)
    }
}

#[derive(Debug, Clone)]
pub struct Companion {
    root: PathBuf,
}

impl Companion {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The BRD installation named by `brd_path`, which must exist.
    pub fn from_config(config: &Config) -> Result<Self> {
        let raw = config
            .brd_dir()
            .ok_or(LoaderError::NotConfigured("BetterRenderDragon path"))?;
        let root = expand_path(&raw.to_string_lossy())?;
        if !root.is_dir() {
            return Err(LoaderError::NotFound {
                what: "BetterRenderDragon directory",
                path: root,
            });
        }
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join(PLUGINS_DIR)
    }

    pub fn plugin_path(&self) -> PathBuf {
        self.plugins_dir().join(PLUGIN_FILE)
    }

    pub fn check(&self) -> Result<PluginStatus> {
        let config_path = self.config_path();
        if !config_path.is_file() {
            return Err(LoaderError::NotFound {
                what: "BetterRenderDragon config",
                path: config_path,
            });
        }

        if !self.plugin_path().is_file() {
            debug!(path = %self.plugin_path().display(), "plugin file absent");
            return Ok(PluginStatus::new(
                PluginState::Missing,
                "MaterialBinLoader is not installed",
            ));
        }

        let document = read_json(&config_path)?;
        let listed = document
            .get("plugins")
            .and_then(Value::as_array)
            .is_some_and(|plugins| plugins.iter().any(|p| p.as_str() == Some(PLUGIN_NAME)));
        if !listed {
            return Ok(PluginStatus::new(
                PluginState::Disabled,
                "MaterialBinLoader is installed but not enabled",
            ));
        }

        let enabled = document
            .get(PLUGIN_NAME)
            .and_then(|block| block.get("enabled"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !enabled {
            return Ok(PluginStatus::new(
                PluginState::Disabled,
                "MaterialBinLoader is installed but disabled",
            ));
        }

        Ok(PluginStatus::new(
            PluginState::Ok,
            "MaterialBinLoader is installed and enabled",
        ))
    }

    /// Copies `bundled` into the plugins directory and enables it in
    /// `config.json`. A failure editing the config leaves the copied file in
    /// place.
    pub fn install(&self, bundled: &Path) -> Result<PathBuf> {
        if !bundled.is_file() {
            return Err(LoaderError::NotFound {
                what: "bundled plugin",
                path: bundled.to_path_buf(),
            });
        }

        let plugins = self.plugins_dir();
        fs::create_dir_all(&plugins)
            .map_err(LoaderError::io("create plugins directory", &plugins))?;
        let target = self.plugin_path();
        fs::copy(bundled, &target).map_err(LoaderError::io("copy plugin to", &target))?;
        info!(source = %bundled.display(), target = %target.display(), "copied plugin");

        self.enable_in_config()?;
        Ok(target)
    }

    fn enable_in_config(&self) -> Result<()> {
        let config_path = self.config_path();
        if !config_path.is_file() {
            return Err(LoaderError::NotFound {
                what: "BetterRenderDragon config",
                path: config_path,
            });
        }

        let mut document = match read_json(&config_path)? {
            Value::Object(map) => map,
            _ => {
                return Err(LoaderError::Invalid(format!(
                    "{} is not a JSON object",
                    config_path.display()
                )))
            }
        };

        enable_plugin(&mut document).map_err(|found| {
            LoaderError::Invalid(format!(
                "{} has a non-array \"plugins\" value ({found})",
                config_path.display()
            ))
        })?;
        write_json(&config_path, &document)?;
        info!(path = %config_path.display(), "enabled plugin in companion config");
        Ok(())
    }
}

/// Adds the plugin to `plugins` and enables its block. A `plugins` value
/// that is not an array is handed back untouched as the error.
fn enable_plugin(document: &mut Map<String, Value>) -> std::result::Result<(), Value> {
    let plugins = document
        .entry("plugins")
        .or_insert_with(|| Value::Array(Vec::new()));
    match plugins {
        Value::Array(list) => {
            if !list.iter().any(|p| p.as_str() == Some(PLUGIN_NAME)) {
                list.push(Value::String(PLUGIN_NAME.to_string()));
            }
        }
        other => return Err(other.clone()),
    }

    document.insert(
        PLUGIN_NAME.to_string(),
        json!({ "enabled": true, "priority": 0 }),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn brd_with_config(config: Value) -> (TempDir, Companion) {
        let root = TempDir::new().unwrap();
        fs::write(
            root.path().join(CONFIG_FILE),
            serde_json::to_string(&config).unwrap(),
        )
        .unwrap();
        let companion = Companion::new(root.path());
        (root, companion)
    }

    fn write_plugin(companion: &Companion) {
        fs::create_dir_all(companion.plugins_dir()).unwrap();
        fs::write(companion.plugin_path(), b"// plugin").unwrap();
    }

    #[test]
    fn from_config_requires_existing_path() {
        let err = Companion::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, LoaderError::NotConfigured(_)));

        let root = TempDir::new().unwrap();
        let mut config = Config::default();
        config.brd_path = root.path().join("absent").to_string_lossy().into_owned();
        let err = Companion::from_config(&config).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound { .. }));
    }

    #[test]
    fn missing_config_is_not_found() {
        let root = TempDir::new().unwrap();
        let err = Companion::new(root.path()).check().unwrap_err();
        assert!(matches!(err, LoaderError::NotFound { .. }));
    }

    #[test]
    fn status_ladder() {
        let (_root, companion) = brd_with_config(json!({ "plugins": [] }));
        assert_eq!(companion.check().unwrap().state, PluginState::Missing);

        write_plugin(&companion);
        let status = companion.check().unwrap();
        assert_eq!(status.state, PluginState::Disabled);
        assert!(status.message.contains("not enabled"));

        fs::write(
            companion.config_path(),
            r#"{"plugins": ["MaterialBinLoader"], "MaterialBinLoader": {"enabled": false}}"#,
        )
        .unwrap();
        let status = companion.check().unwrap();
        assert_eq!(status.state, PluginState::Disabled);
        assert!(status.message.contains("disabled"));

        fs::write(
            companion.config_path(),
            r#"{"plugins": ["MaterialBinLoader"], "MaterialBinLoader": {"enabled": true}}"#,
        )
        .unwrap();
        assert_eq!(companion.check().unwrap().state, PluginState::Ok);
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let root = TempDir::new().unwrap();
        let companion = Companion::new(root.path());
        fs::write(companion.config_path(), b"{not json").unwrap();
        write_plugin(&companion);

        assert_eq!(
            companion.check().unwrap_err().kind(),
            crate::ErrorKind::Parse
        );
    }

    #[test]
    fn install_enables_plugin_and_keeps_foreign_keys() {
        let (root, companion) = brd_with_config(json!({
            "plugins": ["Other"],
            "Other": { "enabled": true },
            "window": { "width": 1280 }
        }));
        let bundled = root.path().join("bundle.js");
        fs::write(&bundled, b"// bundled").unwrap();

        let target = companion.install(&bundled).unwrap();
        assert_eq!(fs::read(target).unwrap(), b"// bundled");

        let document: Value =
            serde_json::from_str(&fs::read_to_string(companion.config_path()).unwrap()).unwrap();
        assert_eq!(document["plugins"], json!(["Other", "MaterialBinLoader"]));
        assert_eq!(document["MaterialBinLoader"], json!({ "enabled": true, "priority": 0 }));
        assert_eq!(document["window"]["width"], 1280);
        assert_eq!(document["Other"]["enabled"], true);
        assert_eq!(companion.check().unwrap().state, PluginState::Ok);

        companion.install(&bundled).unwrap();
        let document: Value =
            serde_json::from_str(&fs::read_to_string(companion.config_path()).unwrap()).unwrap();
        assert_eq!(document["plugins"], json!(["Other", "MaterialBinLoader"]));
    }

    #[test]
    fn install_without_config_copies_then_fails() {
        let root = TempDir::new().unwrap();
        let companion = Companion::new(root.path().join("brd"));
        fs::create_dir_all(companion.root()).unwrap();
        let bundled = root.path().join("bundle.js");
        fs::write(&bundled, b"// bundled").unwrap();

        let err = companion.install(&bundled).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound { what: "BetterRenderDragon config", .. }));
        assert!(companion.plugin_path().is_file());
    }

    #[test]
    fn install_rejects_non_array_plugins() {
        let (root, companion) = brd_with_config(json!({ "plugins": "Other", "keep": 1 }));
        let before = fs::read_to_string(companion.config_path()).unwrap();
        let bundled = root.path().join("bundle.js");
        fs::write(&bundled, b"// bundled").unwrap();

        let err = companion.install(&bundled).unwrap_err();
        assert!(matches!(err, LoaderError::Invalid(_)));
        assert!(err.to_string().contains("plugins"));
        assert_eq!(fs::read_to_string(companion.config_path()).unwrap(), before);
    }

    #[test]
    fn install_adds_missing_plugins_list() {
        let (root, companion) = brd_with_config(json!({ "keep": 1 }));
        let bundled = root.path().join("bundle.js");
        fs::write(&bundled, b"// bundled").unwrap();

        companion.install(&bundled).unwrap();
        let document: Value =
            serde_json::from_str(&fs::read_to_string(companion.config_path()).unwrap()).unwrap();
        assert_eq!(document["plugins"], json!(["MaterialBinLoader"]));
        assert_eq!(document["keep"], 1);
    }

    #[test]
    fn status_maps_to_outcome() {
        let outcome = Outcome::from(PluginStatus::new(PluginState::Missing, "gone"));
        assert_eq!(outcome.status, Status::Missing);
        assert_eq!(outcome.message, "gone");
    }
}
