//! Lists the shader files in the user's shader library and copies new ones
//! into it.
//!
//! Functions:
//!
//! - `list_shaders` never fails: an unset, missing or unreadable directory is
//!   an empty library.
//! - `resolve_shader` turns a stored reference (file name or path) into the
//!   path of the file on disk.
//! - `import_shader` copies an external file into the library under its own
//!   name.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::locate::expand_path;
use crate::{LoaderError, Result};

pub const SHADER_EXTENSIONS: [&str; 5] = ["glsl", "hlsl", "shader", "mcpack", "bin"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize)]
pub struct ShaderEntry {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub modified: Option<DateTime<Local>>,
}

impl ShaderEntry {
    pub fn modified_display(&self) -> String {
        self.modified
            .map(|time| time.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn serialize_timestamp<S>(value: &Option<DateTime<Local>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(time) => serializer.serialize_str(&time.format(TIMESTAMP_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}

pub fn is_shader_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SHADER_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

pub fn list_shaders(directory: &Path) -> Vec<ShaderEntry> {
    if directory.as_os_str().is_empty() || !directory.is_dir() {
        debug!(path = %directory.display(), "shader directory unset or missing");
        return Vec::new();
    }

    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %directory.display(), error = %err, "failed to list shader directory");
            return Vec::new();
        }
    };

    let mut shaders = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !is_shader_file(&path) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping unreadable shader entry");
                continue;
            }
        };

        shaders.push(ShaderEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
            path,
        });
    }

    debug!(path = %directory.display(), count = shaders.len(), "listed shaders");
    shaders
}

/// Resolves a shader reference the way presets and the applier store them.
///
/// Absolute paths and paths that exist relative to the working directory are
/// used as given; anything else is looked up inside `library`.
pub fn resolve_shader(reference: &str, library: Option<&Path>) -> Result<PathBuf> {
    let expanded = expand_path(reference)?;
    if expanded.as_os_str().is_empty() {
        return Err(LoaderError::Invalid("No shader specified".into()));
    }
    if expanded.is_absolute() || expanded.exists() {
        return Ok(expanded);
    }

    match library {
        Some(library) => Ok(library.join(expanded)),
        None => Ok(expanded),
    }
}

/// Copies `source` into `library`, keeping its file name.
pub fn import_shader(source: &Path, library: Option<&Path>) -> Result<PathBuf> {
    let library = library.ok_or(LoaderError::NotConfigured("Shaders path"))?;

    if !source.is_file() {
        return Err(LoaderError::NotFound {
            what: "shader file",
            path: source.to_path_buf(),
        });
    }
    if !is_shader_file(source) {
        return Err(LoaderError::Invalid(format!(
            "{} is not a shader file (expected one of: {})",
            source.display(),
            SHADER_EXTENSIONS.join(", ")
        )));
    }
    let file_name = source
        .file_name()
        .ok_or_else(|| LoaderError::Invalid(format!("{} has no file name", source.display())))?;

    fs::create_dir_all(library).map_err(LoaderError::io("create shader directory", library))?;
    let destination = library.join(file_name);
    if is_same_file(source, &destination) {
        info!(path = %destination.display(), "shader already in library");
        return Ok(destination);
    }
    fs::copy(source, &destination).map_err(LoaderError::io("copy shader to", &destination))?;

    info!(
        source = %source.display(),
        target = %destination.display(),
        "imported shader"
    );
    Ok(destination)
}

/// Whether `a` and `b` resolve to the same existing file. Copying a file
/// onto itself truncates it, so callers skip the copy in that case.
pub(crate) fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
