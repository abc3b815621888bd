pub mod session_sweeper;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use crate::session::SessionRegistry;

/// Owns background tasks and stops them through a shared shutdown channel.
pub struct WorkerManager {
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub async fn start_session_sweeper(
        &self,
        sessions: Arc<SessionRegistry>,
        max_idle: Duration,
        interval: Duration,
    ) {
        let shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(session_sweeper::run(sessions, max_idle, interval, shutdown_rx));
        self.handles.lock().await.push(handle);
        info!(
            max_idle_secs = max_idle.as_secs(),
            interval_secs = interval.as_secs(),
            "session sweeper started"
        );
    }

    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(());
        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "worker task ended abnormally");
            }
        }
        info!("workers stopped");
    }
}

impl Default for WorkerManager {
    fn default() -> Self {
        Self::new()
    }
}
