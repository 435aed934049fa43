//! Error taxonomy for every loader operation and the uniform
//! `{status, message}` value shells hand back to the user.
//!
//! Types:
//!
//! - `LoaderError` is returned by every fallible operation in this crate.
//! - `ErrorKind` groups errors into the classes a shell reports on
//!   (missing files, missing settings, I/O, parsing, external tools).
//! - `Outcome` and `Status` form the boundary value; `From<LoaderError>`
//!   is the only place errors turn into text.
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use settings::SettingsError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    NotConfigured,
    Io,
    Parse,
    ExternalTool,
    Invalid,
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("preset '{0}' not found")]
    PresetNotFound(String),

    #[error("{0} not set")]
    NotConfigured(&'static str),

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to launch {program}: {source}")]
    ExternalTool {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl LoaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::PresetNotFound(_) => ErrorKind::NotFound,
            Self::NotConfigured(_) => ErrorKind::NotConfigured,
            Self::Io { .. } => ErrorKind::Io,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::ExternalTool { .. } => ErrorKind::ExternalTool,
            Self::Invalid(_) => ErrorKind::Invalid,
            Self::Settings(SettingsError::Write { .. }) => ErrorKind::Io,
            Self::Settings(SettingsError::Serialize(_)) => ErrorKind::Parse,
            Self::Settings(SettingsError::Invalid(_)) => ErrorKind::Invalid,
        }
    }

    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Missing,
    Disabled,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Missing => "missing",
            Self::Disabled => "disabled",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Outcome {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(Status::Ok, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

impl From<LoaderError> for Outcome {
    fn from(err: LoaderError) -> Self {
        Self::error(err.to_string())
    }
}
