//! Best-effort audit recording.
//!
//! An audit write never changes the outcome of the operation that caused
//! it: failures and timeouts are logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use bizhub_database::AuditSink;
use bizhub_entity::audit::CreateAuditLogEntry;

/// Writes audit entries with a bounded wait.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    timeout: Duration,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    /// Record `entry`, swallowing any failure.
    pub async fn record(&self, entry: CreateAuditLogEntry) {
        let context = entry.context;
        let business_id = entry.business_id;

        match tokio::time::timeout(self.timeout, self.sink.record(entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(
                    context = %context,
                    business_id = %business_id,
                    error = %e,
                    "Failed to write audit entry"
                );
            }
            Err(_) => {
                warn!(
                    context = %context,
                    business_id = %business_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Audit write timed out"
                );
            }
        }
    }
}
