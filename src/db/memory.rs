use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{StoreError, WordFilter};
use crate::engine::{ProgressRecord, Word, WordId};

/// Process-local store with the same contract as the SQL backends.
///
/// Stands in for a client-side cache of seen/learned ids, and lets tests flip the
/// backend offline to exercise persistence failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    words: RwLock<BTreeMap<WordId, Word>>,
    progress: RwLock<HashMap<(String, WordId), ProgressRecord>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words(words: impl IntoIterator<Item = Word>) -> Self {
        let store = Self::new();
        store.words.write().extend(words.into_iter().map(|w| (w.id, w)));
        store
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    pub fn is_unavailable(&self) -> bool {
        self.unavailable.load(Ordering::Relaxed)
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.is_unavailable() {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }

    pub fn list_words(&self, filter: &WordFilter) -> Result<Vec<Word>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .words
            .read()
            .values()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect())
    }

    pub fn list_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        self.ensure_available()?;
        let mut records: Vec<ProgressRecord> = self
            .progress
            .read()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.word_id);
        Ok(records)
    }

    pub fn list_learned_words(&self, user_id: &str) -> Result<Vec<Word>, StoreError> {
        self.ensure_available()?;
        let progress = self.progress.read();
        Ok(self
            .words
            .read()
            .values()
            .filter(|w| {
                progress
                    .get(&(user_id.to_string(), w.id))
                    .is_some_and(|r| r.is_learned)
            })
            .cloned()
            .collect())
    }

    pub fn upsert_progress(
        &self,
        user_id: &str,
        word_id: WordId,
        is_learned: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        if !self.words.read().contains_key(&word_id) {
            return Err(StoreError::UnknownWord(word_id));
        }
        let record = ProgressRecord {
            user_id: user_id.to_string(),
            word_id,
            is_learned,
            last_reviewed: at,
        };
        self.progress
            .write()
            .insert((user_id.to_string(), word_id), record);
        Ok(())
    }

    pub fn insert_words(&self, words: &[Word]) -> Result<u64, StoreError> {
        self.ensure_available()?;
        let mut guard = self.words.write();
        let mut inserted = 0;
        for word in words {
            if !guard.contains_key(&word.id) {
                guard.insert(word.id, word.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    pub fn count_words(&self) -> Result<i64, StoreError> {
        self.ensure_available()?;
        Ok(self.words.read().len() as i64)
    }
}
