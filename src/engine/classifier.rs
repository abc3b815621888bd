use std::collections::HashMap;

use serde::Serialize;

use super::types::{ProgressRecord, Word, WordId};
use super::Mode;

/// Disjoint, exhaustive split of a corpus for one user. Ids keep corpus order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    pub new: Vec<WordId>,
    pub practice: Vec<WordId>,
    pub review: Vec<WordId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub total: usize,
    pub new: usize,
    pub practice: usize,
    pub review: usize,
}

impl Buckets {
    pub fn get(&self, mode: Mode) -> &[WordId] {
        match mode {
            Mode::New => &self.new,
            Mode::Practice => &self.practice,
            Mode::Review => &self.review,
        }
    }

    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            total: self.new.len() + self.practice.len() + self.review.len(),
            new: self.new.len(),
            practice: self.practice.len(),
            review: self.review.len(),
        }
    }
}

pub fn classify(corpus: &[Word], progress: &[ProgressRecord]) -> Buckets {
    let learned = latest_flags(progress);
    let mut buckets = Buckets::default();

    for word in corpus {
        match learned.get(&word.id) {
            None => buckets.new.push(word.id),
            Some(false) => buckets.practice.push(word.id),
            Some(true) => buckets.review.push(word.id),
        }
    }

    buckets
}

// Duplicate rows break the store's upsert invariant; the most recent one wins.
fn latest_flags(progress: &[ProgressRecord]) -> HashMap<WordId, bool> {
    let mut latest: HashMap<WordId, &ProgressRecord> = HashMap::with_capacity(progress.len());
    for record in progress {
        latest
            .entry(record.word_id)
            .and_modify(|current| {
                if record.last_reviewed >= current.last_reviewed {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    latest
        .into_iter()
        .map(|(id, record)| (id, record.is_learned))
        .collect()
}
