//! The snapshot loop: one sweep per control message, strictly in order.

use std::sync::Arc;

use dnsfun_core::ServiceRegistry;
use dnsfun_snapshot::{sweep, SweepReport};
use tokio::sync::mpsc;

use crate::control::ControlMessage;

/// Run one sweep per message until a [`ControlMessage::Terminate`] has been
/// handled or every sender is gone.
///
/// The next message is not received before the current sweep finished, so
/// sweeps never overlap. A sweep whose task panics is logged and yields no
/// report; the loop keeps going. Returns the report of the last completed
/// sweep, if any.
pub async fn snapshot_loop(
    registry: Arc<ServiceRegistry>,
    mut control_rx: mpsc::Receiver<ControlMessage>,
) -> Option<SweepReport> {
    let mut last = None;
    while let Some(message) = control_rx.recv().await {
        tracing::info!(?message, "running snapshot sweep");
        let registry = registry.clone();
        match tokio::task::spawn_blocking(move || sweep(&registry)).await {
            Ok(report) => last = Some(report),
            Err(err) => tracing::error!(?message, error = %err, "snapshot sweep task failed"),
        }

        if message.ends_process() {
            tracing::info!("final snapshot sweep complete, shutting down");
            return last;
        }
    }
    tracing::info!("control channel closed, snapshot loop exiting");
    last
}
