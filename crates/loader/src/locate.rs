//! Finds the Minecraft Bedrock data directory (`com.mojang`) and expands the
//! user-entered paths stored in the configuration.
//!
//! Types:
//!
//! - `PathResolver` holds the ordered list of well-known install locations and
//!   whether the platform registry should be consulted first.
//!
//! Functions:
//!
//! - `PathResolver::detect_install_path` is advisory: every failure falls
//!   through to the next source and the result is `None` when nothing exists.
//! - `expand_path` performs `~`, `$VAR`, `${VAR}` and `%VAR%` expansion so
//!   Windows-style paths copied from Explorer work the same as shell ones.
//! - `find_package_dir` scans a `Packages` directory for the Minecraft UWP
//!   package and returns its `com.mojang` directory.
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories_next::BaseDirs;
use tracing::debug;

use crate::{LoaderError, Result};

pub const MINECRAFT_PACKAGE: &str = "Microsoft.MinecraftUWP_8wekyb3d8bbwe";

const PACKAGE_PREFIX: &str = "Microsoft.MinecraftUWP";

#[derive(Debug, Clone)]
pub struct PathResolver {
    candidates: Vec<PathBuf>,
    use_registry: bool,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PathResolver {
    pub fn new() -> Self {
        Self {
            candidates: default_candidates(),
            use_registry: true,
        }
    }

    /// A resolver that only checks `candidates`, in order.
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            use_registry: false,
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn detect_install_path(&self) -> Option<PathBuf> {
        if self.use_registry {
            if let Some(found) = registry::lookup() {
                debug!(path = %found.display(), "found minecraft data directory via registry");
                return Some(found);
            }
        }

        for candidate in &self.candidates {
            debug!(candidate = %candidate.display(), "checking minecraft data directory candidate");
            if candidate.is_dir() {
                return Some(candidate.clone());
            }
        }

        debug!("minecraft data directory not detected");
        None
    }
}

fn mojang_dir(packages: &Path, package: &str) -> PathBuf {
    packages
        .join(package)
        .join("LocalState")
        .join("games")
        .join("com.mojang")
}

fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(local) = env::var_os("LOCALAPPDATA").filter(|value| !value.is_empty()) {
        candidates.push(mojang_dir(
            &PathBuf::from(local).join("Packages"),
            MINECRAFT_PACKAGE,
        ));
    }

    if let Some(base) = BaseDirs::new() {
        let home = base.home_dir();
        candidates.push(mojang_dir(
            &home.join("AppData").join("Local").join("Packages"),
            MINECRAFT_PACKAGE,
        ));
        candidates.push(
            home.join(".local")
                .join("share")
                .join("mcpelauncher")
                .join("games")
                .join("com.mojang"),
        );
    }

    candidates.dedup();
    candidates
}

/// Returns the `com.mojang` directory of the first Minecraft UWP package found
/// under `packages`.
pub fn find_package_dir(packages: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(packages).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(PACKAGE_PREFIX) {
            continue;
        }
        let candidate = mojang_dir(packages, name);
        if candidate.is_dir() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(windows)]
mod registry {
    use std::path::PathBuf;

    use tracing::debug;
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
    use winreg::RegKey;

    const SHELL_FOLDERS: &str = r"Software\Microsoft\Windows\CurrentVersion\Explorer\User Shell Folders";
    const UNINSTALL: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";

    pub fn lookup() -> Option<PathBuf> {
        from_shell_folders().or_else(from_uninstall_key)
    }

    fn from_shell_folders() -> Option<PathBuf> {
        let key = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey(SHELL_FOLDERS)
            .inspect_err(|err| debug!(error = %err, "user shell folders key unavailable"))
            .ok()?;
        let raw: String = key.get_value("Local AppData").ok()?;
        let local = super::expand_path(&raw).ok()?;
        super::find_package_dir(&local.join("Packages"))
    }

    fn from_uninstall_key() -> Option<PathBuf> {
        let key = RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey(format!(r"{UNINSTALL}\{}", super::MINECRAFT_PACKAGE))
            .inspect_err(|err| debug!(error = %err, "minecraft uninstall key unavailable"))
            .ok()?;
        let location: String = key.get_value("InstallLocation").ok()?;
        let path = PathBuf::from(location);
        path.is_dir().then_some(path)
    }
}

#[cfg(not(windows))]
mod registry {
    use std::path::PathBuf;

    pub fn lookup() -> Option<PathBuf> {
        None
    }
}

pub fn expand_path(input: &str) -> Result<PathBuf> {
    let expanded_env = expand_env_vars(input.trim())?;
    let expanded = expand_home(&expanded_env)?;
    let path = PathBuf::from(expanded);
    if path.as_os_str() != input {
        debug!(original = %input, expanded = %path.display(), "expanded path");
    }
    Ok(path)
}

fn expand_home(input: &str) -> Result<String> {
    if !input.starts_with('~') {
        return Ok(input.to_string());
    }

    let base_dirs = BaseDirs::new().ok_or_else(|| {
        LoaderError::Invalid("unable to determine home directory for '~' expansion".into())
    })?;
    let home_dir = base_dirs.home_dir();

    if input == "~" {
        return Ok(home_dir.to_string_lossy().into_owned());
    }

    if let Some(rest) = input
        .strip_prefix("~/")
        .or_else(|| input.strip_prefix("~\\"))
    {
        return Ok(home_dir.join(rest).to_string_lossy().into_owned());
    }

    Err(LoaderError::Invalid(format!(
        "user-specific home expansion ('{input}') is not supported"
    )))
}

// Backslashes are path separators on Windows, so unlike a shell there is no
// escape character here.
fn expand_env_vars(input: &str) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '$' => match chars.peek() {
                Some('{') => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(LoaderError::Invalid(
                            "missing closing '}' in environment variable reference".into(),
                        ));
                    }
                    output.push_str(&lookup_var(&name)?);
                }
                Some(&c) if is_env_name_char(c) => {
                    let mut name = String::new();
                    while let Some(&c) = chars.peek() {
                        if !is_env_name_char(c) {
                            break;
                        }
                        name.push(c);
                        chars.next();
                    }
                    output.push_str(&lookup_var(&name)?);
                }
                _ => output.push('$'),
            },
            '%' => {
                let rest: String = chars.clone().collect();
                match rest.find('%') {
                    Some(end) if end > 0 && rest[..end].chars().all(is_env_name_char) => {
                        output.push_str(&lookup_var(&rest[..end])?);
                        for _ in 0..=end {
                            chars.next();
                        }
                    }
                    _ => output.push('%'),
                }
            }
            other => output.push(other),
        }
    }

    Ok(output)
}

fn lookup_var(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(LoaderError::Invalid(
            "environment variable name must not be empty".into(),
        ));
    }
    env::var(name)
        .map_err(|_| LoaderError::Invalid(format!("environment variable '{name}' is not set")))
}

fn is_env_name_char(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}
