use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

use super::types::{Word, WordId};
use super::EngineError;

pub const OPTION_COUNT: usize = 4;
pub const DISTRACTOR_COUNT: usize = OPTION_COUNT - 1;

/// Four-option multiple choice question. The target sits at `correct_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub target: Word,
    pub options: Vec<Word>,
    pub correct_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_sentence: Option<String>,
}

impl Question {
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

/// Builds a question for `target`, drawing distractors from the whole `corpus`
/// regardless of which bucket they belong to.
pub fn build_question<R: Rng + ?Sized>(
    target: &Word,
    corpus: &[Word],
    rng: &mut R,
) -> Result<Question, EngineError> {
    let available = distinct_ids(corpus, target.id);
    if available < DISTRACTOR_COUNT {
        return Err(EngineError::InsufficientCorpus {
            required: OPTION_COUNT,
            available: available + 1,
        });
    }

    let mut chosen: HashSet<WordId> = HashSet::with_capacity(DISTRACTOR_COUNT);
    let mut options: Vec<Word> = Vec::with_capacity(OPTION_COUNT);
    while options.len() < DISTRACTOR_COUNT {
        let Some(candidate) = corpus.choose(rng) else {
            break;
        };
        if candidate.id == target.id || chosen.contains(&candidate.id) {
            continue;
        }
        chosen.insert(candidate.id);
        options.push(candidate.clone());
    }

    let correct_index = rng.random_range(0..OPTION_COUNT);
    options.insert(correct_index, target.clone());

    Ok(Question {
        target: target.clone(),
        options,
        correct_index,
        masked_sentence: None,
    })
}

/// Number of distinct word ids in `corpus` other than `exclude`.
pub fn distinct_ids(corpus: &[Word], exclude: WordId) -> usize {
    corpus
        .iter()
        .map(|word| word.id)
        .filter(|id| *id != exclude)
        .collect::<HashSet<_>>()
        .len()
}
