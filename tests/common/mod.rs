#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use wortschatz_backend::config::Config;
use wortschatz_backend::db::{MemoryStore, Store};
use wortschatz_backend::engine::Word;
use wortschatz_backend::services::speech::RecordingSpeaker;
use wortschatz_backend::state::AppState;

pub const TEST_SECRET: &str = "integration-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub speaker: Arc<RecordingSpeaker>,
}

pub fn word(id: i64, term: &str, sentence: Option<&str>, translation: &str, gender_code: i32) -> Word {
    Word {
        id,
        term: term.to_string(),
        term_sentence: sentence.map(str::to_string),
        translation: translation.to_string(),
        translation_sentence: None,
        level: Some("A1".to_string()),
        gender_code,
        category: "Alltag".to_string(),
    }
}

pub fn sample_corpus() -> Vec<Word> {
    vec![
        word(1, "der Zug", Some("Der Zug kommt an."), "tren", 1),
        word(2, "die Katze", Some("Die Katze schläft."), "kedi", 2),
        word(3, "das Buch", Some("Ich lese das Buch."), "kitap", 3),
        word(4, "gehen", Some("Wir gehen nach Hause."), "gitmek", 0),
        word(5, "der Apfel", Some("Der Apfel ist rot."), "elma", 1),
        word(6, "schnell", None, "hızlı", 0),
    ]
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(sample_corpus(), Config::local())
}

pub fn create_test_app_with(words: Vec<Word>, config: Config) -> TestApp {
    let store = Arc::new(MemoryStore::with_words(words));
    let speaker = Arc::new(RecordingSpeaker::new());
    let state = AppState::new(config, Store::Memory(Arc::clone(&store)), speaker.clone());
    TestApp {
        router: wortschatz_backend::create_app(state.clone()),
        state,
        store,
        speaker,
    }
}

pub fn authenticated_config() -> Config {
    Config {
        local_mode: false,
        jwt_secret: Some(TEST_SECRET.to_string()),
        ..Config::local()
    }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        send(self.router.clone(), request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }
}

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
