use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type WordId = i64;

/// Vocabulary entry. Read-only to the engine; content ingestion owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: WordId,
    #[serde(alias = "word", alias = "german")]
    pub term: String,
    #[serde(default, alias = "example_de", alias = "german_sentence")]
    pub term_sentence: Option<String>,
    #[serde(alias = "translation_tr", alias = "turkish")]
    pub translation: String,
    #[serde(default, alias = "example_tr", alias = "turkish_sentence")]
    pub translation_sentence: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    /// 0 = none, 1/2/3 = der/die/das.
    #[serde(default, alias = "artikel_code")]
    pub gender_code: i32,
    #[serde(default)]
    pub category: String,
}

impl Word {
    pub fn has_sentence(&self) -> bool {
        self.term_sentence
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    pub fn is_gendered(&self) -> bool {
        (1..=3).contains(&self.gender_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: String,
    pub word_id: WordId,
    pub is_learned: bool,
    pub last_reviewed: DateTime<Utc>,
}
