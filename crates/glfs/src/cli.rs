use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use loader::LaunchMethod;

#[derive(Parser, Debug)]
#[command(
    name = "glfs",
    author,
    version,
    about = "Shader loader for Minecraft Bedrock",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Print every result as a JSON object on stdout.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the glfs directories and detect the Minecraft data directory.
    Init,
    /// Show where glfs keeps its configuration and data.
    Paths,
    /// Inspect or change the configuration.
    Config(ConfigCommand),
    /// Manage the shader library.
    Shaders(ShadersCommand),
    /// Manage named shader presets.
    Presets(PresetsCommand),
    /// Check or install the MaterialBinLoader plugin for BetterRenderDragon.
    Mbl(MblCommand),
    /// Start Minecraft.
    Launch(LaunchArgs),
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the current configuration.
    Show,
    /// Set a single path or string setting.
    Set {
        /// One of minecraft_path, shaders_path, brd_path, theme, last_used_shader.
        key: String,
        value: String,
    },
    /// Merge a JSON object into the configuration.
    Update {
        #[arg(value_name = "JSON")]
        document: String,
    },
}

#[derive(Args, Debug)]
pub struct ShadersCommand {
    #[command(subcommand)]
    pub action: ShadersAction,
}

#[derive(Subcommand, Debug)]
pub enum ShadersAction {
    /// List shader files in the library.
    List,
    /// Copy a shader file into the library.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Copy a shader into the glfs resource pack.
    Apply {
        /// File name inside the library, or a path.
        #[arg(value_name = "SHADER")]
        shader: String,
    },
}

#[derive(Args, Debug)]
pub struct PresetsCommand {
    #[command(subcommand)]
    pub action: PresetsAction,
}

#[derive(Subcommand, Debug)]
pub enum PresetsAction {
    List,
    Save { name: String, shader: String },
    /// Apply the shader a preset points to.
    Load { name: String },
    Delete { name: String },
}

#[derive(Args, Debug)]
pub struct MblCommand {
    #[command(subcommand)]
    pub action: MblAction,
}

#[derive(Subcommand, Debug)]
pub enum MblAction {
    /// Report whether the plugin is installed and enabled.
    Status,
    /// Copy the plugin into BetterRenderDragon and enable it.
    Install {
        /// Plugin file to install instead of the bundled copy.
        #[arg(long, value_name = "FILE")]
        plugin: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct LaunchArgs {
    #[arg(long, value_enum, default_value_t = MethodArg::Script)]
    pub method: MethodArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodArg {
    /// BetterRenderDragon's launchminecraft.bat.
    Script,
    /// The minecraft:// URI.
    Uri,
}

impl From<MethodArg> for LaunchMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Script => LaunchMethod::Script,
            MethodArg::Uri => LaunchMethod::Uri,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
