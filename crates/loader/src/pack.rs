//! The `glfs_shaders` resource pack that applied shaders are copied into.
//!
//! The pack lives under `<com.mojang>/resource_packs/glfs_shaders` and is
//! created, manifest included, the first time it is needed. An existing
//! manifest is never rewritten so its UUIDs stay stable for the game.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::json::{read_json, write_json};
use crate::{LoaderError, Result};

pub const PACK_DIR_NAME: &str = "glfs_shaders";

const MANIFEST_FILE: &str = "manifest.json";
const MATERIALS_DIR: &str = "materials";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackManifest {
    pub format_version: u32,
    pub header: PackHeader,
    pub modules: Vec<PackModule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackHeader {
    pub description: String,
    pub name: String,
    pub uuid: Uuid,
    pub version: [u32; 3],
    pub min_engine_version: [u32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackModule {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub uuid: Uuid,
    pub version: [u32; 3],
}

impl PackManifest {
    /// A fresh manifest with newly generated header and module UUIDs.
    pub fn generate() -> Self {
        Self {
            format_version: 2,
            header: PackHeader {
                description: "GLFS Shaders Resource Pack".to_string(),
                name: "GLFS Shaders".to_string(),
                uuid: Uuid::new_v4(),
                version: [1, 0, 0],
                min_engine_version: [1, 19, 0],
            },
            modules: vec![PackModule {
                description: "GLFS Shaders Resources".to_string(),
                kind: "resources".to_string(),
                uuid: Uuid::new_v4(),
                version: [1, 0, 0],
            }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourcePack {
    root: PathBuf,
}

impl ResourcePack {
    pub fn locate(minecraft_dir: &Path) -> Self {
        Self {
            root: minecraft_dir.join("resource_packs").join(PACK_DIR_NAME),
        }
    }

    /// Creates the pack under `minecraft_dir` if it does not exist yet.
    ///
    /// Returns the pack and whether this call wrote its manifest. A pack
    /// directory left without a manifest (for example by an interrupted
    /// earlier run) gets one; an existing manifest is never rewritten. The
    /// `materials` directory is created either way.
    pub fn ensure(minecraft_dir: &Path) -> Result<(Self, bool)> {
        let pack = Self::locate(minecraft_dir);

        if pack.root.exists() && !pack.root.is_dir() {
            return Err(LoaderError::Invalid(format!(
                "filesystem entry at {} is not a directory",
                pack.root.display()
            )));
        }
        fs::create_dir_all(&pack.root)
            .map_err(LoaderError::io("create resource pack", &pack.root))?;

        let created = !pack.manifest_path().exists();
        if created {
            let manifest = PackManifest::generate();
            write_json(&pack.manifest_path(), &manifest)?;
            info!(
                path = %pack.root.display(),
                uuid = %manifest.header.uuid,
                "wrote resource pack manifest"
            );
        } else {
            debug!(path = %pack.root.display(), "reusing existing resource pack");
        }

        let materials = pack.materials_dir();
        fs::create_dir_all(&materials)
            .map_err(LoaderError::io("create materials directory", &materials))?;

        Ok((pack, created))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn materials_dir(&self) -> PathBuf {
        self.root.join(MATERIALS_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn manifest(&self) -> Result<PackManifest> {
        let path = self.manifest_path();
        if !path.exists() {
            return Err(LoaderError::NotFound {
                what: "resource pack manifest",
                path,
            });
        }
        let value = read_json(&path)?;
        serde_json::from_value(value).map_err(|source| LoaderError::Parse { path, source })
    }
}
