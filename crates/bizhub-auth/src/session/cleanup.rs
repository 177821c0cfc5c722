//! Periodic deactivation of expired session records.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use bizhub_core::error::AppError;

use super::registry::SessionRegistry;

/// Sweeps expired records out of the active set.
#[derive(Debug, Clone)]
pub struct SessionCleanup {
    registry: Arc<SessionRegistry>,
}

impl SessionCleanup {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Runs one cleanup cycle.
    ///
    /// Returns the number of records deactivated.
    pub async fn run_cleanup(&self) -> Result<u64, AppError> {
        let cleaned = self.registry.deactivate_expired().await?;
        if cleaned > 0 {
            info!(cleaned = cleaned, "Session cleanup completed");
        }
        Ok(cleaned)
    }

    /// Runs a cleanup cycle every `every` until the task is aborted.
    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_cleanup().await {
                    error!(error = %e, "Session cleanup failed");
                }
            }
        })
    }
}
