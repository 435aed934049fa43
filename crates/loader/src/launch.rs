use std::path::PathBuf;
use std::process::Command;

use settings::Config;
use tracing::info;

use crate::locate::expand_path;
use crate::{LoaderError, Result};

pub const LAUNCH_SCRIPT: &str = "launchminecraft.bat";
pub const MINECRAFT_URI: &str = "minecraft://";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMethod {
    /// Run BetterRenderDragon's launch script so the game starts with BRD
    /// injected.
    #[default]
    Script,
    /// Hand the `minecraft://` URI to the platform opener.
    Uri,
}

/// Starts the game and returns as soon as the process is spawned. Nothing
/// is waited on, so only a failure to spawn is reported.
pub fn launch(config: &Config, method: LaunchMethod) -> Result<()> {
    let mut command = match method {
        LaunchMethod::Script => script_command(config)?,
        LaunchMethod::Uri => uri_command()?,
    };

    let program = command.get_program().to_string_lossy().into_owned();
    command
        .spawn()
        .map_err(|source| LoaderError::ExternalTool {
            program: program.clone(),
            source,
        })?;

    info!(program = %program, method = ?method, "launched minecraft");
    Ok(())
}

fn script_command(config: &Config) -> Result<Command> {
    let raw = config
        .brd_dir()
        .ok_or(LoaderError::NotConfigured("BetterRenderDragon path"))?;
    let brd = expand_path(&raw.to_string_lossy())?;
    let script: PathBuf = brd.join(LAUNCH_SCRIPT);
    if !script.is_file() {
        return Err(LoaderError::NotFound {
            what: "launch script",
            path: script,
        });
    }

    #[cfg(windows)]
    let mut command = {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(&script);
        command
    };
    #[cfg(not(windows))]
    let mut command = Command::new(&script);

    command.current_dir(&brd);
    Ok(command)
}

fn uri_command() -> Result<Command> {
    #[cfg(target_os = "windows")]
    {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", MINECRAFT_URI]);
        return Ok(command);
    }

    #[cfg(target_os = "macos")]
    {
        let mut command = Command::new("open");
        command.arg(MINECRAFT_URI);
        return Ok(command);
    }

    #[cfg(target_os = "linux")]
    {
        let mut command = Command::new("xdg-open");
        command.arg(MINECRAFT_URI);
        return Ok(command);
    }

    #[allow(unreachable_code)]
    Err(LoaderError::Invalid(
        "opening the minecraft:// URI is not supported on this platform".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(brd: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.brd_path = brd.to_string_lossy().into_owned();
        config
    }

    #[test]
    fn script_launch_requires_brd_path() {
        let err = launch(&Config::default(), LaunchMethod::Script).unwrap_err();
        assert!(matches!(err, LoaderError::NotConfigured(_)));
    }

    #[test]
    fn missing_script_is_not_found() {
        let root = TempDir::new().unwrap();
        let err = launch(&config_for(root.path()), LaunchMethod::Script).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound { what: "launch script", .. }));
    }

    #[cfg(unix)]
    #[test]
    fn unspawnable_script_is_an_external_tool_failure() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let script = root.path().join(LAUNCH_SCRIPT);
        fs::write(&script, b"@echo off\r\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();

        let err = launch(&config_for(root.path()), LaunchMethod::Script).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ExternalTool);
    }

    #[test]
    fn script_is_the_default_method() {
        assert_eq!(LaunchMethod::default(), LaunchMethod::Script);
    }
}
