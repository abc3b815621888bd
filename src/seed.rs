use std::path::Path;

use thiserror::Error;

use crate::db::{Store, StoreError};
use crate::engine::Word;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read corpus file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse corpus file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reads a JSON array of words. Field names of the legacy `data.json` export are accepted too.
pub fn load_corpus_file(path: &Path) -> Result<Vec<Word>, SeedError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SeedError::Parse {
        path: display,
        source,
    })
}

/// Loads the corpus file into an empty store. A store that already holds words is left alone.
pub async fn seed_corpus(store: &Store, path: &Path) -> Result<u64, SeedError> {
    let existing = store.count_words().await?;
    if existing > 0 {
        tracing::debug!(existing, "corpus already present, skipping seed");
        return Ok(0);
    }

    let words = load_corpus_file(path)?;
    let inserted = store.insert_words(&words).await?;
    tracing::info!(path = %path.display(), inserted, "seeded word corpus");
    Ok(inserted)
}
