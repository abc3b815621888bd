use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::session::SessionRegistry;

/// Evicts idle study sessions every `interval` until shutdown is signalled.
pub async fn run(
    sessions: Arc<SessionRegistry>,
    max_idle: Duration,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    // first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep_once(&sessions, max_idle);
            }
            _ = shutdown.recv() => {
                debug!("session sweeper shutting down");
                break;
            }
        }
    }
}

pub fn sweep_once(sessions: &SessionRegistry, max_idle: Duration) -> usize {
    let evicted = sessions.evict_idle(max_idle);
    if evicted > 0 {
        info!(evicted, remaining = sessions.len(), "evicted idle study sessions");
    } else {
        debug!(active = sessions.len(), "no idle study sessions");
    }
    evicted
}
