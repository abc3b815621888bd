use serde::Serialize;

use super::sentence::strip_gender_marker;
use super::types::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Der,
    Die,
    Das,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Der, Gender::Die, Gender::Das];

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Gender::Der),
            2 => Some(Gender::Die),
            3 => Some(Gender::Das),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Gender::Der => 1,
            Gender::Die => 2,
            Gender::Das => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Der => "der",
            Gender::Die => "die",
            Gender::Das => "das",
        }
    }
}

/// Article drill item: the learner sees `stem` and picks der/die/das.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderPrompt {
    pub word: Word,
    pub stem: String,
}

impl GenderPrompt {
    pub fn new(word: Word) -> Option<Self> {
        Gender::from_code(word.gender_code)?;
        let stem = strip_gender_marker(&word.term).to_string();
        Some(Self { word, stem })
    }

    pub fn answer(&self) -> Gender {
        Gender::from_code(self.word.gender_code).unwrap_or(Gender::Der)
    }

    pub fn is_correct(&self, code: i32) -> bool {
        self.word.gender_code == code
    }
}
