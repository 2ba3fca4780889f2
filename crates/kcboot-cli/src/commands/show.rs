use anyhow::Result;
use kcboot_config::{ConfigReport, EngineSettings};

use crate::cli::{OutputFormat, ShowConfigArgs};
use crate::live::{load_live, load_snapshot};
use crate::output::print_warning;

pub fn show_config(args: &ShowConfigArgs, settings: &EngineSettings) -> Result<()> {
    let snapshot = load_snapshot(args.snapshot.as_deref())?;
    let live = load_live(&args.live, settings)?;

    let report = ConfigReport::collect(&snapshot, &live, &settings.build_time, &settings.namespace);
    match args.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    for violation in settings.reconciler().violations(&snapshot, &live, false) {
        print_warning(&violation.to_string());
    }
    Ok(())
}
