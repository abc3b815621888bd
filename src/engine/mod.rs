//! Session question-generation and progress-classification engine.
//!
//! Pure, synchronous pieces: the classifier splits a corpus into buckets, the
//! sampler draws a bounded session from one bucket and the generators turn the
//! drawn words into study items. I/O lives in `services::study`.

pub mod choice;
pub mod classifier;
pub mod gender;
pub mod sampler;
pub mod sentence;
pub mod types;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use choice::{build_question, Question, OPTION_COUNT};
pub use classifier::{classify, BucketCounts, Buckets};
pub use gender::{Gender, GenderPrompt};
pub use sampler::{sample, MAX_SESSION_SIZE};
pub use types::{ProgressRecord, Word, WordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    New,
    Practice,
    Review,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::New => "new",
            Mode::Practice => "practice",
            Mode::Review => "review",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Mode::New),
            "practice" => Ok(Mode::Practice),
            "review" => Ok(Mode::Review),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyKind {
    Flashcard,
    Quiz,
    Sentence,
    Article,
}

impl StudyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StudyKind::Flashcard => "flashcard",
            StudyKind::Quiz => "quiz",
            StudyKind::Sentence => "sentence",
            StudyKind::Article => "article",
        }
    }

    /// Whether a word can take part in this kind of session at all, as target or distractor.
    pub fn accepts(self, word: &Word) -> bool {
        match self {
            StudyKind::Flashcard | StudyKind::Quiz => true,
            StudyKind::Sentence => word.has_sentence(),
            StudyKind::Article => word.is_gendered(),
        }
    }

    pub fn uses_options(self) -> bool {
        matches!(self, StudyKind::Quiz | StudyKind::Sentence)
    }
}

impl fmt::Display for StudyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StudyItem {
    Card(Word),
    Choice(Question),
    Gender(GenderPrompt),
}

impl StudyItem {
    pub fn word(&self) -> &Word {
        match self {
            StudyItem::Card(word) => word,
            StudyItem::Choice(question) => &question.target,
            StudyItem::Gender(prompt) => &prompt.word,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("no content available for mode {mode}")]
    NoContentAvailable { mode: Mode },
    #[error("insufficient corpus: {available} distinct words, {required} required")]
    InsufficientCorpus { required: usize, available: usize },
}

/// Classifier -> sampler -> generator for one session.
pub fn build_items<R: Rng + ?Sized>(
    kind: StudyKind,
    mode: Mode,
    corpus: &[Word],
    progress: &[ProgressRecord],
    rng: &mut R,
) -> Result<Vec<StudyItem>, EngineError> {
    let corpus: Vec<Word> = corpus.iter().filter(|w| kind.accepts(w)).cloned().collect();
    let by_id: HashMap<WordId, &Word> = corpus.iter().map(|w| (w.id, w)).collect();
    let buckets = classify(&corpus, progress);

    let mut pool: Vec<&Word> = buckets
        .get(mode)
        .iter()
        .filter_map(|id| by_id.get(id).copied())
        .collect();

    if kind == StudyKind::Sentence {
        let before = pool.len();
        pool.retain(|word| sentence_mask(word).is_some());
        let skipped = before - pool.len();
        if skipped > 0 {
            tracing::debug!(%mode, skipped, "sentence targets failed the data-quality gate");
        }
    }

    if pool.is_empty() {
        return Err(EngineError::NoContentAvailable { mode });
    }

    if kind.uses_options() {
        let available = choice::distinct_ids(&corpus, WordId::MIN);
        if available < OPTION_COUNT {
            return Err(EngineError::InsufficientCorpus {
                required: OPTION_COUNT,
                available,
            });
        }
    }

    let targets = sample(&pool, MAX_SESSION_SIZE, rng);
    let mut items = Vec::with_capacity(targets.len());
    for target in targets {
        let item = match kind {
            StudyKind::Flashcard => StudyItem::Card(target.clone()),
            StudyKind::Quiz => StudyItem::Choice(build_question(target, &corpus, rng)?),
            StudyKind::Sentence => {
                let mut question = build_question(target, &corpus, rng)?;
                question.masked_sentence = sentence_mask(target);
                StudyItem::Choice(question)
            }
            StudyKind::Article => match GenderPrompt::new(target.clone()) {
                Some(prompt) => StudyItem::Gender(prompt),
                None => continue,
            },
        };
        items.push(item);
    }

    Ok(items)
}

fn sentence_mask(word: &Word) -> Option<String> {
    let sentence = word.term_sentence.as_deref()?;
    sentence::masked_for(&word.term, sentence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn word(id: WordId, term: &str, sentence: Option<&str>, gender_code: i32) -> Word {
        Word {
            id,
            term: term.to_string(),
            term_sentence: sentence.map(str::to_string),
            translation: format!("tr-{id}"),
            translation_sentence: None,
            level: Some("A1".to_string()),
            gender_code,
            category: "general".to_string(),
        }
    }

    fn plain_corpus(n: i64) -> Vec<Word> {
        (1..=n).map(|id| word(id, &format!("w{id}"), None, 0)).collect()
    }

    fn learned(word_id: WordId, is_learned: bool) -> ProgressRecord {
        ProgressRecord {
            user_id: "u".to_string(),
            word_id,
            is_learned,
            last_reviewed: Utc::now(),
        }
    }

    #[test]
    fn test_flashcards_capped_at_session_size() {
        let mut rng = StdRng::seed_from_u64(1);
        let items = build_items(StudyKind::Flashcard, Mode::New, &plain_corpus(40), &[], &mut rng)
            .unwrap();
        assert_eq!(items.len(), MAX_SESSION_SIZE);
        assert!(items.iter().all(|i| matches!(i, StudyItem::Card(_))));
    }

    #[test]
    fn test_empty_bucket_is_no_content() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = build_items(StudyKind::Flashcard, Mode::Review, &plain_corpus(5), &[], &mut rng)
            .unwrap_err();
        assert_eq!(err, EngineError::NoContentAvailable { mode: Mode::Review });
    }

    #[test]
    fn test_quiz_targets_come_from_bucket_distractors_from_corpus() {
        let mut rng = StdRng::seed_from_u64(2);
        let corpus = plain_corpus(12);
        let progress = vec![learned(1, true), learned(2, true)];
        let items = build_items(StudyKind::Quiz, Mode::Review, &corpus, &progress, &mut rng).unwrap();

        assert_eq!(items.len(), 2);
        let mut saw_other_bucket = false;
        for item in &items {
            let StudyItem::Choice(question) = item else {
                panic!("expected a choice item");
            };
            assert!(question.target.id == 1 || question.target.id == 2);
            saw_other_bucket |= question.options.iter().any(|w| w.id > 2);
        }
        assert!(saw_other_bucket);
    }

    #[test]
    fn test_quiz_needs_four_words() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = build_items(StudyKind::Quiz, Mode::New, &plain_corpus(3), &[], &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientCorpus {
                required: 4,
                available: 3
            }
        );
    }

    #[test]
    fn test_sentence_gate_skips_unmaskable_targets() {
        let mut rng = StdRng::seed_from_u64(4);
        let corpus = vec![
            word(1, "der Zug", Some("Der Zug kommt an."), 1),
            word(2, "gehen", Some("Ich gehe nach Hause."), 0),
            word(3, "die Stadt", Some("Die Stadt ist groß."), 2),
            word(4, "das Haus", Some("Das Haus ist alt."), 3),
            word(5, "der Tisch", None, 1),
        ];
        let items = build_items(StudyKind::Sentence, Mode::New, &corpus, &[], &mut rng).unwrap();

        let mut ids: Vec<_> = items.iter().map(|i| i.word().id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3, 4]);
        for item in &items {
            let StudyItem::Choice(question) = item else {
                panic!("expected a choice item");
            };
            assert!(question.masked_sentence.as_deref().unwrap().contains(sentence::MASK));
            assert!(question.options.iter().all(|w| w.id != 5));
        }
    }

    #[test]
    fn test_sentence_gate_emptying_pool_is_no_content() {
        let mut rng = StdRng::seed_from_u64(4);
        let corpus = vec![
            word(1, "gehen", Some("Ich gehe."), 0),
            word(2, "a", Some("b"), 0),
            word(3, "c", Some("d"), 0),
            word(4, "e", Some("f"), 0),
        ];
        let err = build_items(StudyKind::Sentence, Mode::New, &corpus, &[], &mut rng).unwrap_err();
        assert_eq!(err, EngineError::NoContentAvailable { mode: Mode::New });
    }

    #[test]
    fn test_article_drill_uses_gendered_words_only() {
        let mut rng = StdRng::seed_from_u64(5);
        let corpus = vec![
            word(1, "der Zug", None, 1),
            word(2, "laufen", None, 0),
            word(3, "das Haus", None, 3),
        ];
        let items = build_items(StudyKind::Article, Mode::New, &corpus, &[], &mut rng).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items
            .iter()
            .all(|i| matches!(i, StudyItem::Gender(p) if p.word.is_gendered())));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Practice".parse::<Mode>().unwrap(), Mode::Practice);
        assert!("later".parse::<Mode>().is_err());
    }
}
