use anyhow::Result;
use kcboot_config::{EngineSettings, FeatureResolver};

use crate::cli::FeatureArgs;
use crate::live::{load_live, load_snapshot};

pub fn feature(args: &FeatureArgs, settings: &EngineSettings) -> Result<()> {
    let snapshot = load_snapshot(args.snapshot.as_deref())?;
    let live = load_live(&args.live, settings)?;

    let resolver = FeatureResolver::new(&snapshot, &live).with_naming(settings.features.clone());
    match resolver.resolve(&args.key) {
        Some(value) => println!("{value}"),
        None => println!("(not set)"),
    }
    Ok(())
}
