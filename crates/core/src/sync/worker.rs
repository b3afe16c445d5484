use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use super::service::SyncService;
use crate::events::bus::EventBus;
use crate::events::types::LifecycleEvent;

/// Subscribe to `bus` and drive `service` from a background task.
///
/// The subscription is taken before this returns, so events published
/// afterwards are never missed. The task ends once every bus handle has
/// been dropped and the queue is drained.
pub fn spawn(bus: &EventBus, service: Arc<SyncService>) -> JoinHandle<()> {
    let events = bus.subscribe();
    tokio::spawn(run(events, service))
}

/// Handle events one at a time, in arrival order.
pub async fn run(mut events: broadcast::Receiver<LifecycleEvent>, service: Arc<SyncService>) {
    tracing::info!("sync worker started");
    loop {
        match events.recv().await {
            Ok(event) => {
                service.handle(&event).await;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "sync worker lagged; lifecycle events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    tracing::info!("sync worker stopped");
}
