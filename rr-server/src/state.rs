//! Application state management

use rr_core::provider::TelemetryProvider;
use rr_core::session::{FrameSnapshot, ReplaySession};
use rr_core::ReplayConfig;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Telemetry source, built once per process
    pub provider: Arc<dyn TelemetryProvider>,

    pub replay_config: Arc<ReplayConfig>,

    /// Broadcast channel for replay snapshots
    /// Multiple consumers can subscribe to receive snapshots
    pub snapshot_tx: broadcast::Sender<FrameSnapshot>,

    /// Active server-side replay (None when no replay is loaded)
    pub replay: Arc<RwLock<Option<ReplaySession>>>,

    /// Cancellation token for the replay playback task
    pub replay_cancel: Arc<RwLock<Option<CancellationToken>>>,
}

impl AppState {
    pub fn new(provider: Arc<dyn TelemetryProvider>, replay_config: ReplayConfig) -> Self {
        // Create broadcast channel with capacity for 100 snapshots
        let (snapshot_tx, _) = broadcast::channel(100);

        Self {
            provider,
            replay_config: Arc::new(replay_config),
            snapshot_tx,
            replay: Arc::new(RwLock::new(None)),
            replay_cancel: Arc::new(RwLock::new(None)),
        }
    }

    /// Subscribe to replay snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<FrameSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Publish a snapshot; having no subscribers is not an error
    pub fn publish(&self, snapshot: FrameSnapshot) {
        let _ = self.snapshot_tx.send(snapshot);
    }
}
