//! Site rebuild hook.
//!
//! The static site generator runs elsewhere; we only poke a webhook.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

/// Result of a rebuild request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// No hook configured.
    Disabled,
    /// The hook answered with a success status.
    Triggered { status: u16 },
    /// The hook answered with an error status or could not be reached.
    Failed(String),
}

/// POSTs to a configured rebuild URL.
#[derive(Debug, Clone)]
pub struct SiteRebuilder {
    client: Client,
    url: Option<String>,
    timeout: Duration,
}

impl SiteRebuilder {
    pub fn new(url: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.filter(|u| !u.trim().is_empty()),
            timeout,
        }
    }

    /// A rebuilder with no hook configured.
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(30))
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Fire the hook in the background; the outcome is only logged.
    pub fn trigger(&self, reason: &str) {
        if !self.is_enabled() {
            debug!("Rebuild hook not configured, skipping ({})", reason);
            return;
        }
        let this = self.clone();
        let reason = reason.to_string();
        tokio::spawn(async move {
            match this.run().await {
                RebuildOutcome::Triggered { status } => {
                    info!("Site rebuild triggered ({}): HTTP {}", reason, status)
                }
                RebuildOutcome::Failed(e) => warn!("Site rebuild failed ({}): {}", reason, e),
                RebuildOutcome::Disabled => {}
            }
        });
    }

    /// Call the hook and wait for the answer.
    pub async fn run(&self) -> RebuildOutcome {
        let Some(url) = &self.url else {
            return RebuildOutcome::Disabled;
        };

        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .send()
            .await;
        match response {
            Ok(resp) if resp.status().is_success() => RebuildOutcome::Triggered {
                status: resp.status().as_u16(),
            },
            Ok(resp) => RebuildOutcome::Failed(format!("HTTP {}", resp.status())),
            Err(e) if e.is_timeout() => {
                RebuildOutcome::Failed(format!("timed out after {:?}", self.timeout))
            }
            Err(e) => RebuildOutcome::Failed(e.to_string()),
        }
    }
}
