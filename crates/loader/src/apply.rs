use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use settings::SettingsStore;
use tracing::{debug, info};

use crate::catalog::{is_same_file, resolve_shader};
use crate::locate::expand_path;
use crate::pack::ResourcePack;
use crate::{LoaderError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedShader {
    pub name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub pack_created: bool,
}

/// Copies shaders into the `glfs_shaders` resource pack.
///
/// The file keeps its own name inside `materials/`, so applying several
/// shaders leaves all of them in the pack.
#[derive(Debug, Clone, Copy)]
pub struct ShaderApplier<'a> {
    store: &'a SettingsStore,
}

impl<'a> ShaderApplier<'a> {
    pub fn new(store: &'a SettingsStore) -> Self {
        Self { store }
    }

    pub fn apply(&self, reference: &str) -> Result<AppliedShader> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(LoaderError::Invalid("No shader specified".into()));
        }

        let config = self.store.snapshot();
        let library = config
            .shaders_dir()
            .map(|dir| expand_path(&dir.to_string_lossy()))
            .transpose()?;
        let source = resolve_shader(reference, library.as_deref())?;
        if !source.is_file() {
            return Err(LoaderError::NotFound {
                what: "shader file",
                path: source,
            });
        }

        let minecraft = config
            .minecraft_dir()
            .ok_or(LoaderError::NotConfigured("Minecraft path"))?;
        let minecraft = expand_path(&minecraft.to_string_lossy())?;

        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                LoaderError::Invalid(format!("{} has no file name", source.display()))
            })?;

        let (pack, pack_created) = ResourcePack::ensure(&minecraft)?;
        let destination = pack.materials_dir().join(&name);
        if is_same_file(&source, &destination) {
            debug!(path = %destination.display(), "shader already in resource pack");
        } else {
            fs::copy(&source, &destination)
                .map_err(LoaderError::io("copy shader to", &destination))?;
        }

        let recorded = source.to_string_lossy().into_owned();
        self.store
            .update(|config| config.last_used_shader = recorded)?;

        info!(
            shader = %name,
            source = %source.display(),
            target = %destination.display(),
            "applied shader"
        );

        Ok(AppliedShader {
            name,
            source,
            destination,
            pack_created,
        })
    }
}
