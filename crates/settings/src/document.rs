use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::SettingsError;

/// Keys every configuration document carries, in the order they are written.
pub const KNOWN_KEYS: [&str; 6] = [
    "minecraft_path",
    "shaders_path",
    "brd_path",
    "theme",
    "last_used_shader",
    "presets",
];

/// User preferences persisted as `config.json`.
///
/// Keys this version does not know about are kept in `extra` so a document
/// written by another build survives a load/save cycle untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub minecraft_path: String,
    pub shaders_path: String,
    pub brd_path: String,
    pub theme: String,
    pub last_used_shader: String,
    pub presets: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minecraft_path: String::new(),
            shaders_path: String::new(),
            brd_path: String::new(),
            theme: default_theme(),
            last_used_shader: String::new(),
            presets: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

fn default_theme() -> String {
    "dark".to_string()
}

impl Config {
    /// Parses a stored document.
    ///
    /// A known key holding `null` or a value of the wrong type is dropped on
    /// its own and falls back to its default; the rest of the document is
    /// kept. Only syntax errors and a non-object top level fail.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        let mut document = match serde_json::from_str::<Value>(input)? {
            Value::Object(map) => map,
            other => return serde_json::from_value(other),
        };

        for key in KNOWN_KEYS {
            let fits = document.get(key).map(|value| known_value_fits(key, value));
            if fits == Some(false) {
                if let Some(dropped) = document.remove(key) {
                    warn!(key, value = %dropped, "ignoring ill-typed configuration value");
                }
            }
        }

        serde_json::from_value(Value::Object(document))
    }

    pub fn minecraft_dir(&self) -> Option<PathBuf> {
        non_empty_path(&self.minecraft_path)
    }

    pub fn shaders_dir(&self) -> Option<PathBuf> {
        non_empty_path(&self.shaders_path)
    }

    pub fn brd_dir(&self) -> Option<PathBuf> {
        non_empty_path(&self.brd_path)
    }

    pub fn preset(&self, name: &str) -> Option<&str> {
        self.presets.get(name).map(String::as_str)
    }

    /// Returns a copy of `self` with the keys of `partial` layered on top.
    ///
    /// Keys absent from `partial` keep their current values. The merge goes
    /// through the JSON representation so an ill-typed value (for example a
    /// number for `presets`) is rejected instead of silently dropped.
    pub fn merged(&self, partial: &Value) -> Result<Self, SettingsError> {
        let Value::Object(incoming) = partial else {
            return Err(SettingsError::Invalid(
                "configuration update must be a JSON object".into(),
            ));
        };

        let mut current = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => {
                return Err(SettingsError::Invalid(
                    "configuration did not serialize to an object".into(),
                ))
            }
        };

        for (key, value) in incoming {
            current.insert(key.clone(), value.clone());
        }

        serde_json::from_value(Value::Object(current))
            .map_err(|err| SettingsError::Invalid(err.to_string()))
    }
}

fn known_value_fits(key: &str, value: &Value) -> bool {
    match key {
        "presets" => value
            .as_object()
            .is_some_and(|presets| presets.values().all(Value::is_string)),
        _ => value.is_string(),
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_empty_with_dark_theme() {
        let config = Config::default();
        assert_eq!(config.theme, "dark");
        assert!(config.minecraft_path.is_empty());
        assert!(config.presets.is_empty());
        assert!(config.extra.is_empty());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config = Config::from_json_str(r#"{ "brd_path": "C:/BRD" }"#).unwrap();
        assert_eq!(config.brd_path, "C:/BRD");
        assert_eq!(config.theme, "dark");
        assert!(config.last_used_shader.is_empty());
    }

    #[test]
    fn unknown_keys_are_kept() {
        let config =
            Config::from_json_str(r#"{ "theme": "light", "window": { "width": 900 } }"#).unwrap();
        assert_eq!(config.extra.get("window"), Some(&json!({ "width": 900 })));

        let serialized = serde_json::to_value(&config).unwrap();
        assert_eq!(serialized["window"]["width"], 900);
        assert_eq!(serialized["theme"], "light");
    }

    #[test]
    fn null_or_ill_typed_keys_fall_back_individually() {
        let config = Config::from_json_str(
            r#"{
                "minecraft_path": "/srv/mojang",
                "last_used_shader": null,
                "theme": 7,
                "presets": { "night": "night.hlsl" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.minecraft_path, "/srv/mojang");
        assert!(config.last_used_shader.is_empty());
        assert_eq!(config.theme, "dark");
        assert_eq!(config.preset("night"), Some("night.hlsl"));
        assert!(config.extra.is_empty());
    }

    #[test]
    fn preset_map_with_non_string_value_is_dropped() {
        let config = Config::from_json_str(
            r#"{ "shaders_path": "/shaders", "presets": { "night": 3 } }"#,
        )
        .unwrap();
        assert_eq!(config.shaders_path, "/shaders");
        assert!(config.presets.is_empty());
    }

    #[test]
    fn syntax_errors_and_non_objects_still_fail() {
        assert!(Config::from_json_str("{ \"theme\": \"light\", }").is_err());
        assert!(Config::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn merged_overrides_only_present_keys() {
        let mut config = Config::default();
        config.shaders_path = "/shaders".into();
        config.presets.insert("night".into(), "night.hlsl".into());

        let merged = config
            .merged(&json!({ "theme": "light", "brd_path": "/brd" }))
            .unwrap();

        assert_eq!(merged.theme, "light");
        assert_eq!(merged.brd_path, "/brd");
        assert_eq!(merged.shaders_path, "/shaders");
        assert_eq!(merged.preset("night"), Some("night.hlsl"));
    }

    #[test]
    fn merged_rejects_ill_typed_values() {
        let config = Config::default();
        let err = config.merged(&json!({ "presets": 3 })).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));

        let err = config.merged(&json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn blank_paths_read_as_unset() {
        let mut config = Config::default();
        config.minecraft_path = "   ".into();
        config.brd_path = "/opt/brd".into();
        assert!(config.minecraft_dir().is_none());
        assert_eq!(config.brd_dir(), Some(PathBuf::from("/opt/brd")));
    }
}
