use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::db::Store;
use crate::services::speech::Speaker;
use crate::services::study::StudyService;
use crate::session::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    config: Arc<Config>,
    store: Store,
    study: Arc<StudyService>,
}

impl AppState {
    pub fn new(config: Config, store: Store, speaker: Arc<dyn Speaker>) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let study = StudyService::new(
            store.clone(),
            sessions,
            speaker,
            config.speech_language.clone(),
        );
        Self {
            started_at: Instant::now(),
            config: Arc::new(config),
            store,
            study: Arc::new(study),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn study(&self) -> Arc<StudyService> {
        Arc::clone(&self.study)
    }
}
