//! Assembles the live configuration and the persisted snapshot from CLI inputs

use anyhow::{Context, Result};
use kcboot_config::{BuildTimeSnapshot, ConfigLayer, EngineSettings, LayeredConfig};
use std::path::Path;

use crate::cli::LiveArgs;

/// Ordinals follow the usual precedence: file < environment < command line
const FILE_ORDINAL: i32 = 100;
const ENV_ORDINAL: i32 = 300;
const CLI_ORDINAL: i32 = 400;

pub const ENV_SOURCE: &str = "EnvConfigSource";
pub const CLI_SOURCE: &str = "CliArgs";
const ENV_PREFIX: &str = "KEYCLOAK_";

pub fn load_live(args: &LiveArgs, settings: &EngineSettings) -> Result<LayeredConfig> {
    let vars: Vec<(String, String)> = if args.no_env {
        Vec::new()
    } else {
        std::env::vars().collect()
    };
    build_live(args, settings, vars)
}

fn build_live(
    args: &LiveArgs,
    settings: &EngineSettings,
    vars: Vec<(String, String)>,
) -> Result<LayeredConfig> {
    let mut live = LayeredConfig::new();

    if let Some(path) = &args.config {
        let layer = ConfigLayer::from_toml_file(settings.baked_source.as_str(), FILE_ORDINAL, path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        tracing::debug!(path = %path.display(), properties = layer.len(), "Loaded configuration file");
        live.push(layer);
    }

    live.push(ConfigLayer::from_env(
        ENV_SOURCE,
        ENV_ORDINAL,
        ENV_PREFIX,
        &settings.namespace,
        vars,
    ));
    live.push(ConfigLayer::from_pairs(
        CLI_SOURCE,
        CLI_ORDINAL,
        args.overrides.iter().cloned(),
    ));

    Ok(live)
}

pub fn load_snapshot(path: Option<&Path>) -> Result<BuildTimeSnapshot> {
    match path {
        Some(path) => BuildTimeSnapshot::load(path)
            .with_context(|| format!("Failed to read server image snapshot {}", path.display())),
        None => Ok(BuildTimeSnapshot::empty()),
    }
}
