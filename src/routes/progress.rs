use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::engine::{BucketCounts, Word};
use crate::response::{AppError, SuccessResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/progress/summary", get(summary))
        .route("/dictionary", get(dictionary))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    #[serde(flatten)]
    counts: BucketCounts,
    learned: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DictionaryResponse {
    total: usize,
    words: Vec<Word>,
}

async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let counts = state.study().summary(&user.id).await?;
    Ok(Json(SuccessResponse::new(SummaryResponse {
        learned: counts.review,
        counts,
    })))
}

async fn dictionary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let words = state.study().learned_words(&user.id).await?;
    Ok(Json(SuccessResponse::new(DictionaryResponse {
        total: words.len(),
        words,
    })))
}
