//! Serve command.

use console::style;

use crate::config::Settings;

/// Run the HTTP API in the foreground.
pub async fn cmd_serve(settings: &Settings) -> anyhow::Result<()> {
    println!(
        "{} Starting draftpress on http://{}",
        style("→").cyan(),
        settings.bind_addr()
    );
    println!("  Project root: {}", settings.project_root.display());
    if let Some(url) = &settings.rebuild_url {
        println!("  Rebuild hook: {}", url);
    }

    crate::server::serve(settings).await
}
