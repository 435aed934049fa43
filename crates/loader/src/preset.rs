use std::collections::BTreeMap;

use settings::SettingsStore;
use tracing::info;

use crate::apply::{AppliedShader, ShaderApplier};
use crate::{LoaderError, Result};

/// Named shortcuts to shaders, stored in the `presets` map of the
/// configuration. Every call is its own persisted write.
#[derive(Debug, Clone, Copy)]
pub struct PresetManager<'a> {
    store: &'a SettingsStore,
    applier: ShaderApplier<'a>,
}

impl<'a> PresetManager<'a> {
    pub fn new(store: &'a SettingsStore) -> Self {
        Self {
            store,
            applier: ShaderApplier::new(store),
        }
    }

    pub fn list(&self) -> BTreeMap<String, String> {
        self.store.snapshot().presets
    }

    pub fn save(&self, name: &str, shader: &str) -> Result<()> {
        let name = name.trim();
        let shader = shader.trim();
        if name.is_empty() || shader.is_empty() {
            return Err(LoaderError::Invalid(
                "Preset name and shader name are required".into(),
            ));
        }

        let previous = self.store.update(|config| {
            config
                .presets
                .insert(name.to_string(), shader.to_string())
        })?;

        info!(preset = %name, shader = %shader, replaced = previous.is_some(), "saved preset");
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<AppliedShader> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LoaderError::Invalid("Preset name is required".into()));
        }

        let shader = self
            .store
            .snapshot()
            .preset(name)
            .map(str::to_string)
            .ok_or_else(|| LoaderError::PresetNotFound(name.to_string()))?;

        info!(preset = %name, shader = %shader, "loading preset");
        self.applier.apply(&shader)
    }

    /// Removes `name` and returns the shader it pointed to.
    pub fn delete(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LoaderError::Invalid("Preset name is required".into()));
        }

        let removed = self.store.try_update(|config| {
            config
                .presets
                .remove(name)
                .ok_or_else(|| LoaderError::PresetNotFound(name.to_string()))
        })?;

        info!(preset = %name, "deleted preset");
        Ok(removed)
    }
}
