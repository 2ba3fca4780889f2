use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kcboot")]
#[command(about = "kcboot: reconcile baked and live Keycloak server configuration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine settings file (namespace, build-time table, feature naming)
    #[arg(long, global = true, env = "KCBOOT_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, env = "KCBOOT_LOG", default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile the server image with the current configuration
    Start(StartArgs),
    /// Capture the current configuration into a new server image snapshot
    Build(BuildArgs),
    /// Show baked and current configuration
    ShowConfig(ShowConfigArgs),
    /// Resolve a feature flag
    Feature(FeatureArgs),
}

/// Where the live configuration comes from
#[derive(clap::Args)]
pub struct LiveArgs {
    /// Properties file baked into the image
    #[arg(short, long, env = "KCBOOT_CONFIG")]
    pub config: Option<PathBuf>,
    /// Override a property (key=value), may be repeated
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub overrides: Vec<(String, String)>,
    /// Ignore KEYCLOAK_* environment variables
    #[arg(long)]
    pub no_env: bool,
}

#[derive(clap::Args)]
pub struct StartArgs {
    /// Snapshot persisted when the image was built (replaced on rebuild)
    #[arg(short, long)]
    pub snapshot: PathBuf,
    #[command(flatten)]
    pub live: LiveArgs,
    /// Rebuild the image from the current configuration before starting
    #[arg(long)]
    pub rebuild: bool,
}

#[derive(clap::Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub live: LiveArgs,
    /// Where to write the snapshot
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct ShowConfigArgs {
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,
    #[command(flatten)]
    pub live: LiveArgs,
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(clap::Args)]
pub struct FeatureArgs {
    /// Lookup key (e.g. profile.feature.scripts)
    pub key: String,
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,
    #[command(flatten)]
    pub live: LiveArgs,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
