//! Periodic re-invocation loop.
//!
//! The importer performs no internal retries; a failed batch simply
//! invalidates the checkpoint and the next invocation re-derives its
//! resume point. This loop is that next invocation: it calls
//! [`MetricImporter::import_from_last_timestamp`] at a fixed interval
//! until the shutdown token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::importer::MetricImporter;

/// Drive `importer` on a fixed interval until `shutdown` is cancelled.
///
/// The shutdown token doubles as the cancellation signal forwarded into
/// each import, so a batch in flight aborts promptly on shutdown.
/// Errors are logged and retried on the next tick, never fatal.
pub async fn run_import_loop(
    importer: Arc<MetricImporter>,
    poll_interval: Duration,
    shutdown: CancellationToken,
) {
    loop {
        if shutdown.is_cancelled() {
            info!("Shutdown requested, stopping import loop");
            return;
        }

        // Not raced against the shutdown token: the token is forwarded
        // into the import, which observes it and settles the checkpoint
        // before returning.
        let outcome = importer.import_from_last_timestamp(&shutdown, true).await;

        match outcome.error {
            Some(err) => warn!("import failed, will retry on next poll: {err}"),
            None => info!(
                "import complete ({} ranges), waiting {}s before next poll",
                outcome.ranges.len(),
                poll_interval.as_secs()
            ),
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested during poll wait");
                return;
            }
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}
