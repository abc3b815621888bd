use std::future;
use std::sync::Arc;
use std::time::Duration;

use wortschatz_backend::db::config::DbConfig;
use wortschatz_backend::db::Store;
use wortschatz_backend::engine::{Mode, StudyKind};
use wortschatz_backend::services::speech::RecordingSpeaker;
use wortschatz_backend::services::study::{StudyError, StudyService};
use wortschatz_backend::session::{Phase, Response, SessionError, SessionRegistry, SessionView};

mod common;

async fn sqlite_service() -> StudyService {
    let config = DbConfig {
        url: Some("sqlite::memory:".to_string()),
        max_connections: 1,
        acquire_timeout: Duration::from_secs(5),
    };
    let store = Store::connect(&config).await.unwrap();
    store.insert_words(&common::sample_corpus()).await.unwrap();
    StudyService::new(
        store,
        Arc::new(SessionRegistry::new()),
        Arc::new(RecordingSpeaker::new()),
        "de-DE",
    )
}

/// Advances once the in-flight write has been recorded on the session.
async fn advance_when_settled(service: &StudyService, user: &str) -> SessionView {
    for _ in 0..200 {
        match service.advance(user) {
            Ok(view) => return view,
            Err(StudyError::Session(SessionError::WriteNotIssued)) => {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Err(other) => panic!("unexpected advance error: {other}"),
        }
    }
    panic!("write for {user} was never recorded");
}

#[tokio::test]
async fn test_dropped_submit_still_settles_session() {
    let service = sqlite_service().await;
    service
        .start_session("u1", StudyKind::Flashcard, Mode::New)
        .await
        .unwrap();

    // The caller goes away after the first poll, while the write is in flight.
    let completed = tokio::select! {
        biased;
        _ = service.submit("u1", Response::Judgment { knew: true }) => true,
        _ = future::ready(()) => false,
    };
    assert!(!completed);

    let next = advance_when_settled(&service, "u1").await;
    assert_eq!(next.cursor, 1);
    assert_eq!(next.phase, Phase::Answering);
    assert_eq!(next.score, 1);
    assert!(next.persistence_failures.is_empty());

    let progress = service.store().list_progress("u1").await.unwrap();
    assert_eq!(progress.len(), 1);
    assert!(progress[0].is_learned);

    let report = service
        .submit("u1", Response::Judgment { knew: false })
        .await
        .unwrap();
    assert!(report.persisted);
    assert_eq!(service.store().list_progress("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_submit_reports_write_on_sqlite() {
    let service = sqlite_service().await;
    service
        .start_session("u1", StudyKind::Quiz, Mode::New)
        .await
        .unwrap();

    let report = service
        .submit("u1", Response::Choice { index: 0 })
        .await
        .unwrap();
    assert!(report.persisted);
    assert!(report.persistence_error.is_none());
    assert_eq!(report.session.phase, Phase::Answered);

    let progress = service.store().list_progress("u1").await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].word_id, report.grade.word_id);
    assert_eq!(progress[0].is_learned, report.grade.correct);
}
