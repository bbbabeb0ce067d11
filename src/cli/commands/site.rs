//! Project setup and rebuild commands.

use console::style;

use crate::config::Settings;
use crate::services::{RebuildOutcome, SiteRebuilder};

/// Create the layout and repair state left by interrupted writes.
pub fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let report = settings.prepare_storage()?;

    println!(
        "{} Initialized {}",
        style("✓").green(),
        settings.project_root.display()
    );
    if report.is_clean() {
        return Ok(());
    }
    for id in &report.duplicates_resolved {
        println!("  kept processed copy of {}", id);
    }
    for path in &report.orphans_removed {
        println!("  removed orphan {}", path.display());
    }
    if report.temp_files_removed > 0 {
        println!("  removed {} temp file(s)", report.temp_files_removed);
    }
    Ok(())
}

/// Call the rebuild hook and wait for the answer.
pub async fn cmd_rebuild(settings: &Settings) -> anyhow::Result<()> {
    let rebuilder = SiteRebuilder::new(settings.rebuild_url.clone(), settings.rebuild_timeout());
    report_rebuild(rebuilder.run().await);
    Ok(())
}

pub(super) fn report_rebuild(outcome: RebuildOutcome) {
    match outcome {
        RebuildOutcome::Disabled => println!(
            "{} No rebuild hook configured (set rebuild_url or DRAFTPRESS_REBUILD_URL)",
            style("!").yellow()
        ),
        RebuildOutcome::Triggered { status } => {
            println!("{} Rebuild triggered (HTTP {})", style("✓").green(), status)
        }
        RebuildOutcome::Failed(e) => println!("{} Rebuild failed: {}", style("✗").red(), e),
    }
}
