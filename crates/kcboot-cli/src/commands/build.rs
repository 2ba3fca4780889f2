use anyhow::{Context, Result};
use kcboot_config::EngineSettings;

use crate::cli::BuildArgs;
use crate::live::load_live;
use crate::output::{print_success, print_warning};

/// Capture the current image properties into a new snapshot file
pub fn build(args: &BuildArgs, settings: &EngineSettings) -> Result<()> {
    let live = load_live(&args.live, settings)?;
    let reconciler = settings.reconciler();

    let snapshot = reconciler.capture(&live);

    // Values that start would reject anyway, e.g. build-time options set through the environment
    for violation in reconciler.violations(&snapshot, &live, true) {
        print_warning(&violation.to_string());
    }

    snapshot
        .save(&args.output)
        .with_context(|| format!("Failed to write snapshot {}", args.output.display()))?;

    print_success(&format!(
        "Captured {} properties into {}",
        snapshot.len(),
        args.output.display()
    ));
    Ok(())
}
