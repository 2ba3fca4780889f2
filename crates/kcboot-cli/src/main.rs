mod cli;
mod commands;
mod live;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;
use kcboot_config::{EngineSettings, ReconcileError};

use cli::{Cli, Commands};
use output::print_error;

fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    if let Err(e) = run() {
        // Reconciliation failures are the startup contract: one diagnostic line, then exit
        if let Some(violation) = e.downcast_ref::<ReconcileError>() {
            eprintln!("{violation}");
            std::process::exit(violation.exit_code());
        }
        print_error(&format!("{e:#}"));
        std::process::exit(2);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    let settings = EngineSettings::load(cli.settings.as_deref())?;

    match &cli.command {
        Commands::Start(args) => commands::start::start(args, &settings)?,
        Commands::Build(args) => commands::build::build(args, &settings)?,
        Commands::ShowConfig(args) => commands::show::show_config(args, &settings)?,
        Commands::Feature(args) => commands::feature::feature(args, &settings)?,
    }

    Ok(())
}
