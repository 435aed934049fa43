mod document;
mod store;

pub use document::{Config, KNOWN_KEYS};
pub use store::{
    backup_config, load_config, read_config, save_config, ConfigSource, SettingsStore,
};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
