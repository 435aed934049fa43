mod apply;
mod catalog;
mod companion;
mod json;
mod launch;
mod locate;
mod outcome;
mod pack;
mod preset;

pub use apply::{AppliedShader, ShaderApplier};
pub use catalog::{
    import_shader, is_shader_file, list_shaders, resolve_shader, ShaderEntry, SHADER_EXTENSIONS,
};
pub use companion::{Companion, PluginState, PluginStatus, PLUGIN_FILE, PLUGIN_NAME};
pub use launch::{launch, LaunchMethod, LAUNCH_SCRIPT, MINECRAFT_URI};
pub use locate::{expand_path, find_package_dir, PathResolver, MINECRAFT_PACKAGE};
pub use outcome::{ErrorKind, LoaderError, Outcome, Status};
pub use pack::{PackHeader, PackManifest, PackModule, ResourcePack, PACK_DIR_NAME};
pub use preset::PresetManager;

pub type Result<T, E = LoaderError> = std::result::Result<T, E>;
