//! Per-session state machine.
//!
//! `Loading -> Ready -> (Answering <-> Answered)* -> Finished`, with `Empty` as the
//! terminal state of a session that loaded zero items. Each item accepts exactly
//! one decision, and the cursor only moves once the progress write for that
//! decision has been issued.

pub mod registry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::engine::{
    Gender, Mode, StudyItem, StudyKind, Word, WordId, OPTION_COUNT,
};

pub use registry::SessionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Loading,
    Ready,
    Answering,
    Answered,
    Finished,
    Empty,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Finished | Phase::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    /// Flashcard self-report.
    Judgment { knew: bool },
    /// Option index for quiz/sentence items, gender code for article items.
    Choice { index: usize },
}

/// Result of one decision, including the progress write it calls for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub word_id: WordId,
    pub correct: bool,
    pub is_learned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Persisted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceFailure {
    pub word_id: WordId,
    pub is_learned: bool,
    pub error: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is {0:?}, not accepting answers")]
    NotAnswering(Phase),
    #[error("current item was already answered")]
    AlreadyAnswered,
    #[error("{response} does not apply to a {kind} session")]
    WrongResponse {
        kind: StudyKind,
        response: &'static str,
    },
    #[error("choice {index} is out of range")]
    InvalidChoice { index: usize },
    #[error("progress write for the current item has not been issued")]
    WriteNotIssued,
    #[error("session is {0:?}, cannot {1}")]
    InvalidTransition(Phase, &'static str),
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    kind: StudyKind,
    mode: Mode,
    items: Vec<StudyItem>,
    cursor: usize,
    score: usize,
    phase: Phase,
    last_grade: Option<Grade>,
    write_issued: bool,
    failures: Vec<PersistenceFailure>,
}

impl Session {
    pub fn new(kind: StudyKind, mode: Mode) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            mode,
            items: Vec::new(),
            cursor: 0,
            score: 0,
            phase: Phase::Loading,
            last_grade: None,
            write_issued: false,
            failures: Vec::new(),
        }
    }

    pub fn load(&mut self, items: Vec<StudyItem>) -> Result<Phase, SessionError> {
        if self.phase != Phase::Loading {
            return Err(SessionError::InvalidTransition(self.phase, "load"));
        }
        self.phase = if items.is_empty() {
            Phase::Empty
        } else {
            Phase::Ready
        };
        self.items = items;
        Ok(self.phase)
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Ready {
            return Err(SessionError::InvalidTransition(self.phase, "start"));
        }
        self.phase = Phase::Answering;
        Ok(())
    }

    pub fn submit(&mut self, response: Response) -> Result<Grade, SessionError> {
        match self.phase {
            Phase::Answering => {}
            Phase::Answered => return Err(SessionError::AlreadyAnswered),
            other => return Err(SessionError::NotAnswering(other)),
        }

        let item = self
            .items
            .get(self.cursor)
            .ok_or(SessionError::NotAnswering(self.phase))?;

        let grade = match (item, response) {
            (StudyItem::Card(word), Response::Judgment { knew }) => Grade {
                word_id: word.id,
                correct: knew,
                is_learned: knew,
                correct_index: None,
            },
            (StudyItem::Choice(question), Response::Choice { index }) => {
                if index >= OPTION_COUNT {
                    return Err(SessionError::InvalidChoice { index });
                }
                let correct = question.is_correct(index);
                Grade {
                    word_id: question.target.id,
                    correct,
                    is_learned: correct,
                    correct_index: Some(question.correct_index),
                }
            }
            (StudyItem::Gender(prompt), Response::Choice { index }) => {
                let code = i32::try_from(index).unwrap_or(i32::MAX);
                if Gender::from_code(code).is_none() {
                    return Err(SessionError::InvalidChoice { index });
                }
                let correct = prompt.is_correct(code);
                Grade {
                    word_id: prompt.word.id,
                    correct,
                    is_learned: correct,
                    correct_index: Some(prompt.answer().code() as usize),
                }
            }
            (_, Response::Judgment { .. }) => {
                return Err(SessionError::WrongResponse {
                    kind: self.kind,
                    response: "judgment",
                })
            }
            (_, Response::Choice { .. }) => {
                return Err(SessionError::WrongResponse {
                    kind: self.kind,
                    response: "choice",
                })
            }
        };

        if grade.correct {
            self.score += 1;
        }
        self.phase = Phase::Answered;
        self.write_issued = false;
        self.last_grade = Some(grade.clone());
        Ok(grade)
    }

    /// Marks the progress write of the current decision as issued, keeping failures visible.
    pub fn record_write(&mut self, status: WriteStatus) -> Result<(), SessionError> {
        if self.phase != Phase::Answered {
            return Err(SessionError::InvalidTransition(self.phase, "record a write"));
        }
        let grade = self
            .last_grade
            .as_ref()
            .ok_or(SessionError::InvalidTransition(self.phase, "record a write"))?;
        if let WriteStatus::Failed(error) = status {
            self.failures.push(PersistenceFailure {
                word_id: grade.word_id,
                is_learned: grade.is_learned,
                error,
                at: Utc::now(),
            });
        }
        self.write_issued = true;
        Ok(())
    }

    pub fn advance(&mut self) -> Result<Phase, SessionError> {
        if self.phase != Phase::Answered {
            return Err(SessionError::InvalidTransition(self.phase, "advance"));
        }
        if !self.write_issued {
            return Err(SessionError::WriteNotIssued);
        }

        self.last_grade = None;
        self.write_issued = false;
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
            self.phase = Phase::Answering;
        } else {
            self.phase = Phase::Finished;
        }
        Ok(self.phase)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> StudyKind {
        self.kind
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> Option<&StudyItem> {
        if self.phase.is_terminal() {
            return None;
        }
        self.items.get(self.cursor)
    }

    pub fn failures(&self) -> &[PersistenceFailure] {
        &self.failures
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            kind: self.kind,
            mode: self.mode,
            phase: self.phase,
            cursor: self.cursor,
            total: self.items.len(),
            score: self.score,
            item: self.current().map(|item| ItemView::new(item, self.phase)),
            last_grade: self.last_grade.clone(),
            persistence_failures: self.failures.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub kind: StudyKind,
    pub mode: Mode,
    pub phase: Phase,
    pub cursor: usize,
    pub total: usize,
    pub score: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_grade: Option<Grade>,
    pub persistence_failures: Vec<PersistenceFailure>,
}

/// Item as shown to the learner; the answer stays hidden until it is graded.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ItemView {
    #[serde(rename_all = "camelCase")]
    Card { word: Word },
    #[serde(rename_all = "camelCase")]
    Choice {
        word_id: WordId,
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        masked_sentence: Option<String>,
        options: Vec<ChoiceOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        correct_index: Option<usize>,
    },
    #[serde(rename_all = "camelCase")]
    Gender {
        word_id: WordId,
        stem: String,
        options: Vec<GenderOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        answer: Option<i32>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub word_id: WordId,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderOption {
    pub code: i32,
    pub label: &'static str,
}

impl ItemView {
    fn new(item: &StudyItem, phase: Phase) -> Self {
        let revealed = phase == Phase::Answered;
        match item {
            StudyItem::Card(word) => ItemView::Card { word: word.clone() },
            StudyItem::Choice(question) => {
                // Sentence items ask for the source term, plain quiz items for the translation.
                let sentence = question.masked_sentence.is_some();
                let options = question
                    .options
                    .iter()
                    .map(|w| ChoiceOption {
                        word_id: w.id,
                        label: if sentence {
                            w.term.clone()
                        } else {
                            w.translation.clone()
                        },
                    })
                    .collect();
                ItemView::Choice {
                    word_id: question.target.id,
                    prompt: if sentence {
                        question.target.translation.clone()
                    } else {
                        question.target.term.clone()
                    },
                    masked_sentence: question.masked_sentence.clone(),
                    options,
                    correct_index: revealed.then_some(question.correct_index),
                }
            }
            StudyItem::Gender(prompt) => ItemView::Gender {
                word_id: prompt.word.id,
                stem: prompt.stem.clone(),
                options: Gender::ALL
                    .iter()
                    .map(|g| GenderOption {
                        code: g.code(),
                        label: g.label(),
                    })
                    .collect(),
                answer: revealed.then_some(prompt.answer().code()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{GenderPrompt, Question};

    fn word(id: WordId, gender_code: i32) -> Word {
        Word {
            id,
            term: format!("der W{id}"),
            term_sentence: None,
            translation: format!("t{id}"),
            translation_sentence: None,
            level: None,
            gender_code,
            category: "c".to_string(),
        }
    }

    fn cards(n: i64) -> Vec<StudyItem> {
        (1..=n).map(|id| StudyItem::Card(word(id, 0))).collect()
    }

    fn started(kind: StudyKind, items: Vec<StudyItem>) -> Session {
        let mut session = Session::new(kind, Mode::New);
        session.load(items).unwrap();
        session.start().unwrap();
        session
    }

    #[test]
    fn test_empty_load_is_terminal_and_not_finished() {
        let mut session = Session::new(StudyKind::Flashcard, Mode::Review);
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(session.load(Vec::new()).unwrap(), Phase::Empty);
        assert_ne!(session.phase(), Phase::Finished);
        assert!(session.start().is_err());
        assert!(session.current().is_none());
    }

    #[test]
    fn test_full_flashcard_run() {
        let mut session = started(StudyKind::Flashcard, cards(2));

        let grade = session.submit(Response::Judgment { knew: true }).unwrap();
        assert_eq!(grade.word_id, 1);
        assert!(grade.is_learned);
        session.record_write(WriteStatus::Persisted).unwrap();
        assert_eq!(session.advance().unwrap(), Phase::Answering);

        let grade = session.submit(Response::Judgment { knew: false }).unwrap();
        assert!(!grade.is_learned);
        session.record_write(WriteStatus::Persisted).unwrap();
        assert_eq!(session.advance().unwrap(), Phase::Finished);

        assert_eq!(session.score(), 1);
        assert!(session.submit(Response::Judgment { knew: true }).is_err());
    }

    #[test]
    fn test_no_double_scoring() {
        let mut session = started(StudyKind::Flashcard, cards(3));
        session.submit(Response::Judgment { knew: true }).unwrap();
        assert_eq!(
            session.submit(Response::Judgment { knew: true }),
            Err(SessionError::AlreadyAnswered)
        );
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_advance_requires_issued_write() {
        let mut session = started(StudyKind::Flashcard, cards(2));
        assert!(session.advance().is_err());
        session.submit(Response::Judgment { knew: false }).unwrap();
        assert_eq!(session.advance(), Err(SessionError::WriteNotIssued));
        session.record_write(WriteStatus::Persisted).unwrap();
        assert!(session.advance().is_ok());
    }

    #[test]
    fn test_failed_write_is_kept_and_session_continues() {
        let mut session = started(StudyKind::Flashcard, cards(2));
        session.submit(Response::Judgment { knew: true }).unwrap();
        session
            .record_write(WriteStatus::Failed("store offline".to_string()))
            .unwrap();
        assert_eq!(session.advance().unwrap(), Phase::Answering);

        let failures = session.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].word_id, 1);
        assert!(failures[0].is_learned);
        assert_eq!(session.view().persistence_failures.len(), 1);
    }

    #[test]
    fn test_choice_grading_and_reveal() {
        let target = word(1, 0);
        let options = vec![word(2, 0), word(3, 0), target.clone(), word(4, 0)];
        let question = Question {
            target,
            options,
            correct_index: 2,
            masked_sentence: None,
        };
        let mut session = started(StudyKind::Quiz, vec![StudyItem::Choice(question)]);

        match session.view().item {
            Some(ItemView::Choice { correct_index, .. }) => assert_eq!(correct_index, None),
            other => panic!("unexpected item {other:?}"),
        }

        assert_eq!(
            session.submit(Response::Choice { index: 4 }),
            Err(SessionError::InvalidChoice { index: 4 })
        );
        assert!(matches!(
            session.submit(Response::Judgment { knew: true }),
            Err(SessionError::WrongResponse { .. })
        ));

        let grade = session.submit(Response::Choice { index: 0 }).unwrap();
        assert!(!grade.correct);
        assert_eq!(grade.correct_index, Some(2));
        assert_eq!(session.score(), 0);

        match session.view().item {
            Some(ItemView::Choice { correct_index, .. }) => assert_eq!(correct_index, Some(2)),
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[test]
    fn test_gender_grading() {
        let prompt = GenderPrompt::new(word(7, 2)).unwrap();
        let mut session = started(StudyKind::Article, vec![StudyItem::Gender(prompt)]);
        assert_eq!(
            session.submit(Response::Choice { index: 0 }),
            Err(SessionError::InvalidChoice { index: 0 })
        );
        let grade = session.submit(Response::Choice { index: 2 }).unwrap();
        assert!(grade.correct);
        assert_eq!(session.score(), 1);
    }
}
