use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::{LoaderError, Result};

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path).map_err(LoaderError::io("read", path))?;
    serde_json::from_str(&contents).map_err(|source| LoaderError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `value` with the four-space indentation the game and BRD files use.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| LoaderError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    fs::write(path, buffer).map_err(LoaderError::io("write", path))
}
