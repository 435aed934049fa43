use std::path::PathBuf;

use loader::{
    import_shader, launch, list_shaders, Companion, LoaderError, Outcome, PresetManager,
    ShaderApplier,
};
use serde::Serialize;
use serde_json::{json, Value};
use settings::{SettingsError, SettingsStore, KNOWN_KEYS};
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ConfigAction, LaunchArgs, MblAction, PresetsAction, ShadersAction};
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// What a command prints: the outcome itself plus, for listings, the lines
/// shown under it in text mode.
#[derive(Debug)]
pub struct Report {
    pub outcome: Outcome,
    pub lines: Vec<String>,
}

impl Report {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            lines: Vec::new(),
        }
    }

    fn with_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }

    pub fn render(&self, json: bool) -> String {
        if json {
            return serde_json::to_string(&self.outcome)
                .unwrap_or_else(|err| encode_failure(&err.to_string()));
        }

        let mut text = format!("{}: {}", self.outcome.status.as_str(), self.outcome.message);
        for line in &self.lines {
            text.push_str("\n  ");
            text.push_str(line);
        }
        text
    }
}

fn encode_failure(reason: &str) -> String {
    json!({
        "status": "error",
        "message": format!("failed to encode outcome: {reason}"),
    })
    .to_string()
}

impl From<LoaderError> for Report {
    fn from(err: LoaderError) -> Self {
        tracing::debug!(kind = ?err.kind(), "command failed");
        Self::new(Outcome::from(err))
    }
}

pub fn execute(command: Command, paths: &AppPaths, store: &SettingsStore) -> Report {
    let result = match command {
        Command::Init => init(paths, store),
        Command::Paths => describe_paths(paths, store),
        Command::Config(cmd) => handle_config(cmd.action, store),
        Command::Shaders(cmd) => handle_shaders(cmd.action, store),
        Command::Presets(cmd) => handle_presets(cmd.action, store),
        Command::Mbl(cmd) => handle_mbl(cmd.action, paths, store),
        Command::Launch(args) => handle_launch(args, store),
    };
    result.unwrap_or_else(Report::from)
}

fn to_data<T: Serialize>(value: &T) -> Result<Value, LoaderError> {
    serde_json::to_value(value).map_err(|err| LoaderError::from(SettingsError::from(err)))
}

fn library(store: &SettingsStore) -> Result<Option<PathBuf>, LoaderError> {
    store
        .snapshot()
        .shaders_dir()
        .map(|dir| loader::expand_path(&dir.to_string_lossy()))
        .transpose()
}

fn init(paths: &AppPaths, store: &SettingsStore) -> Result<Report, LoaderError> {
    let config = store.snapshot();
    let minecraft = if config.minecraft_path.is_empty() {
        "not detected".to_string()
    } else {
        config.minecraft_path.clone()
    };
    let lines = vec![
        format!("config:    {}", paths.config_file().display()),
        format!("minecraft: {minecraft}"),
        format!("shaders:   {}", config.shaders_path),
    ];
    let outcome = Outcome::ok("glfs initialised").with_data(to_data(&config)?);
    Ok(Report::new(outcome).with_lines(lines))
}

fn describe_paths(paths: &AppPaths, store: &SettingsStore) -> Result<Report, LoaderError> {
    let plugin = paths.bundled_plugin();
    let data = json!({
        "config_dir": paths.config_dir(),
        "data_dir": paths.data_dir(),
        "share_dir": paths.share_dir(),
        "config_file": store.path(),
        "bundled_plugin": plugin,
    });
    let lines = vec![
        format!("config:  {}", paths.config_dir().display()),
        format!("data:    {}", paths.data_dir().display()),
        format!("share:   {}", paths.share_dir().display()),
        format!("file:    {}", store.path().display()),
        format!("plugin:  {}", plugin.display()),
    ];
    Ok(Report::new(Outcome::ok("glfs paths").with_data(data)).with_lines(lines))
}

fn handle_config(action: ConfigAction, store: &SettingsStore) -> Result<Report, LoaderError> {
    match action {
        ConfigAction::Show => {
            let config = store.snapshot();
            let data = to_data(&config)?;
            let lines = match &data {
                Value::Object(map) => map.iter().map(|(k, v)| format!("{k} = {v}")).collect(),
                _ => Vec::new(),
            };
            Ok(Report::new(Outcome::ok("current configuration").with_data(data)).with_lines(lines))
        }
        ConfigAction::Set { key, value } => {
            if key == "presets" || !KNOWN_KEYS.contains(&key.as_str()) {
                return Err(LoaderError::Invalid(format!(
                    "unknown setting '{key}'; use presets commands for presets"
                )));
            }
            let mut partial = serde_json::Map::new();
            partial.insert(key.clone(), Value::String(value.clone()));
            store.update_config(&Value::Object(partial))?;
            Ok(Report::new(Outcome::ok(format!("{key} set to {value}"))))
        }
        ConfigAction::Update { document } => {
            let partial: Value = serde_json::from_str(&document)
                .map_err(|err| LoaderError::Invalid(format!("invalid JSON document: {err}")))?;
            let config = store.update_config(&partial)?;
            Ok(Report::new(
                Outcome::ok("configuration updated").with_data(to_data(&config)?),
            ))
        }
    }
}

fn handle_shaders(action: ShadersAction, store: &SettingsStore) -> Result<Report, LoaderError> {
    match action {
        ShadersAction::List => {
            let library = library(store)?;
            let shaders = library.as_deref().map(list_shaders).unwrap_or_default();
            let lines = shaders
                .iter()
                .map(|shader| {
                    format!(
                        "{:<32} {:>10} bytes  {}",
                        shader.name,
                        shader.size,
                        shader.modified_display()
                    )
                })
                .collect();
            let message = format!("{} shader(s) found", shaders.len());
            Ok(Report::new(Outcome::ok(message).with_data(to_data(&shaders)?)).with_lines(lines))
        }
        ShadersAction::Import { file } => {
            let library = library(store)?;
            let imported = import_shader(&file, library.as_deref())?;
            Ok(Report::new(
                Outcome::ok(format!("Imported {}", imported.display()))
                    .with_data(json!({ "path": imported })),
            ))
        }
        ShadersAction::Apply { shader } => {
            let applied = ShaderApplier::new(store).apply(&shader)?;
            Ok(Report::new(
                Outcome::ok(format!("Applied {}", applied.name)).with_data(to_data(&applied)?),
            ))
        }
    }
}

fn handle_presets(action: PresetsAction, store: &SettingsStore) -> Result<Report, LoaderError> {
    let presets = PresetManager::new(store);
    match action {
        PresetsAction::List => {
            let all = presets.list();
            let lines = all
                .iter()
                .map(|(name, shader)| format!("{name} -> {shader}"))
                .collect();
            let message = format!("{} preset(s)", all.len());
            Ok(Report::new(Outcome::ok(message).with_data(to_data(&all)?)).with_lines(lines))
        }
        PresetsAction::Save { name, shader } => {
            presets.save(&name, &shader)?;
            Ok(Report::new(Outcome::ok(format!("Preset '{}' saved", name.trim()))))
        }
        PresetsAction::Load { name } => {
            let applied = presets.load(&name)?;
            Ok(Report::new(
                Outcome::ok(format!("Preset '{}' applied {}", name.trim(), applied.name))
                    .with_data(to_data(&applied)?),
            ))
        }
        PresetsAction::Delete { name } => {
            presets.delete(&name)?;
            Ok(Report::new(Outcome::ok(format!("Preset '{}' deleted", name.trim()))))
        }
    }
}

fn handle_mbl(
    action: MblAction,
    paths: &AppPaths,
    store: &SettingsStore,
) -> Result<Report, LoaderError> {
    let companion = Companion::from_config(&store.snapshot())?;
    match action {
        MblAction::Status => Ok(Report::new(Outcome::from(companion.check()?))),
        MblAction::Install { plugin } => {
            let bundled = plugin.unwrap_or_else(|| paths.bundled_plugin());
            let installed = companion.install(&bundled)?;
            Ok(Report::new(
                Outcome::ok("MaterialBinLoader installed and enabled")
                    .with_data(json!({ "path": installed })),
            ))
        }
    }
}

fn handle_launch(args: LaunchArgs, store: &SettingsStore) -> Result<Report, LoaderError> {
    launch(&store.snapshot(), args.method.into())?;
    Ok(Report::new(Outcome::ok("Minecraft launched")))
}
