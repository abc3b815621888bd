use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{Store, StoreError, WordFilter};
use crate::engine::{self, BucketCounts, EngineError, Mode, StudyItem, StudyKind, Word};
use crate::services::speech::Speaker;
use crate::session::{
    Grade, Response, Session, SessionError, SessionRegistry, SessionView, WriteStatus,
};

pub const FEEDBACK_CORRECT: &str = "Richtig!";
pub const FEEDBACK_WRONG: &str = "Falsch.";

#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no active session")]
    NoActiveSession,
    #[error("progress write task failed: {0}")]
    WriteTask(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReport {
    pub grade: Grade,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
    pub session: SessionView,
}

/// Corpus columns a session kind needs; distractors come from the same set.
pub fn word_filter(kind: StudyKind) -> WordFilter {
    WordFilter {
        with_sentence: kind == StudyKind::Sentence,
        gendered_only: kind == StudyKind::Article,
    }
}

pub struct StudyService {
    store: Store,
    sessions: Arc<SessionRegistry>,
    speaker: Arc<dyn Speaker>,
    language: String,
}

impl StudyService {
    pub fn new(
        store: Store,
        sessions: Arc<SessionRegistry>,
        speaker: Arc<dyn Speaker>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sessions,
            speaker,
            language: language.into(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn sessions(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.sessions)
    }

    /// Classifies, samples and generates a session, replacing any session the user had.
    pub async fn start_session(
        &self,
        user_id: &str,
        kind: StudyKind,
        mode: Mode,
    ) -> Result<SessionView, StudyError> {
        let corpus = self.store.list_words(&word_filter(kind)).await?;
        let progress = self.store.list_progress(user_id).await?;

        let items = engine::build_items(kind, mode, &corpus, &progress, &mut rand::rng())?;

        let mut session = Session::new(kind, mode);
        if session.load(items)? == crate::session::Phase::Empty {
            return Err(EngineError::NoContentAvailable { mode }.into());
        }
        session.start()?;

        let view = session.view();
        if self.sessions.insert(user_id, session).is_some() {
            tracing::info!(user_id, "replaced previous study session");
        }
        tracing::info!(user_id, session_id = %view.id, %kind, %mode, items = view.total, "study session started");
        Ok(view)
    }

    pub fn current(&self, user_id: &str) -> Result<SessionView, StudyError> {
        self.sessions
            .get(user_id)
            .map(|session| session.view())
            .ok_or(StudyError::NoActiveSession)
    }

    /// Grades one decision and writes the outcome before the cursor may move on.
    ///
    /// A failed write does not fail the call: it is returned in the report and kept on
    /// the session, so the learner can continue while the discrepancy stays visible.
    /// The write runs on its own task and settles the session even if the caller goes away.
    pub async fn submit(&self, user_id: &str, response: Response) -> Result<SubmitReport, StudyError> {
        let (session_id, grade, cue) = self
            .sessions
            .with_session(user_id, |session| {
                let cue = session.current().and_then(feedback_cue);
                session
                    .submit(response)
                    .map(|grade| (session.id(), grade, cue))
            })
            .ok_or(StudyError::NoActiveSession)??;

        let write = tokio::spawn(write_outcome(
            self.store.clone(),
            Arc::clone(&self.sessions),
            user_id.to_string(),
            session_id,
            grade.clone(),
        ));
        let (session, persistence_error) = write.await??;

        if let Some(follow_up) = cue {
            self.speak_feedback(grade.correct, follow_up.as_deref());
        }

        Ok(SubmitReport {
            persisted: persistence_error.is_none(),
            persistence_error,
            grade,
            session,
        })
    }

    pub fn advance(&self, user_id: &str) -> Result<SessionView, StudyError> {
        let view = self
            .sessions
            .with_session(user_id, |session| session.advance().map(|_| session.view()))
            .ok_or(StudyError::NoActiveSession)??;
        if view.phase.is_terminal() {
            tracing::info!(user_id, score = view.score, total = view.total, "study session finished");
        }
        Ok(view)
    }

    pub fn discard(&self, user_id: &str) -> bool {
        self.sessions.remove(user_id).is_some()
    }

    pub async fn summary(&self, user_id: &str) -> Result<BucketCounts, StudyError> {
        let corpus = self.store.list_words(&WordFilter::all()).await?;
        let progress = self.store.list_progress(user_id).await?;
        Ok(engine::classify(&corpus, &progress).counts())
    }

    /// Words in the user's review bucket, ordered by id.
    pub async fn learned_words(&self, user_id: &str) -> Result<Vec<Word>, StudyError> {
        Ok(self.store.list_learned_words(user_id).await?)
    }

    fn speak_feedback(&self, correct: bool, follow_up: Option<&str>) {
        let verdict = if correct { FEEDBACK_CORRECT } else { FEEDBACK_WRONG };
        self.speaker.speak(verdict, &self.language);
        if let Some(text) = follow_up {
            self.speaker.speak(text, &self.language);
        }
    }
}

/// Upserts the graded outcome and records the write status on the session it came from.
async fn write_outcome(
    store: Store,
    sessions: Arc<SessionRegistry>,
    user_id: String,
    session_id: Uuid,
    grade: Grade,
) -> Result<(SessionView, Option<String>), StudyError> {
    let status = match store
        .upsert_progress(&user_id, grade.word_id, grade.is_learned, Utc::now())
        .await
    {
        Ok(()) => WriteStatus::Persisted,
        Err(err) => {
            tracing::warn!(
                error = %err,
                user_id = %user_id,
                word_id = grade.word_id,
                is_learned = grade.is_learned,
                "progress write failed"
            );
            WriteStatus::Failed(err.to_string())
        }
    };

    let persistence_error = match &status {
        WriteStatus::Failed(error) => Some(error.clone()),
        WriteStatus::Persisted => None,
    };

    let view = sessions
        .with_session(&user_id, |session| {
            // The session may have been replaced while the write was in flight.
            if session.id() != session_id {
                return Err(StudyError::NoActiveSession);
            }
            session
                .record_write(status)
                .map(|()| session.view())
                .map_err(StudyError::from)
        })
        .ok_or(StudyError::NoActiveSession)??;

    Ok((view, persistence_error))
}

// `None` for flashcards (no spoken verdict); otherwise the text read after the verdict.
fn feedback_cue(item: &StudyItem) -> Option<Option<String>> {
    match item {
        StudyItem::Card(_) => None,
        StudyItem::Choice(question) if question.masked_sentence.is_some() => {
            Some(question.target.term_sentence.clone())
        }
        StudyItem::Choice(question) => Some(Some(question.target.term.clone())),
        StudyItem::Gender(prompt) => Some(Some(prompt.word.term.clone())),
    }
}
