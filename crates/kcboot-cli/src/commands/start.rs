use anyhow::{Context, Result};
use kcboot_config::EngineSettings;

use crate::cli::StartArgs;
use crate::live::{load_live, load_snapshot};

/// Reconcile and stay silent on success; violations propagate as `ReconcileError`
///
/// With `--rebuild` the image is recomposed from the live configuration and
/// the new snapshot replaces the old file once it has been accepted.
pub fn start(args: &StartArgs, settings: &EngineSettings) -> Result<()> {
    let live = load_live(&args.live, settings)?;
    let reconciler = settings.reconciler();

    let snapshot = if args.rebuild {
        reconciler.capture(&live)
    } else {
        load_snapshot(Some(args.snapshot.as_path()))?
    };

    let installed = reconciler.reconcile(snapshot, &live, args.rebuild)?;

    if args.rebuild {
        installed
            .save(&args.snapshot)
            .with_context(|| format!("Failed to write snapshot {}", args.snapshot.display()))?;
    }

    tracing::info!(
        baked = installed.len(),
        rebuild = args.rebuild,
        "Server image configuration accepted"
    );
    Ok(())
}
