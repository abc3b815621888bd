use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::engine::{Mode, StudyKind};
use crate::response::{AppError, SuccessResponse};
use crate::services::study::StudyError;
use crate::session::Response as StudyResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_session))
        .route("/current", get(current_session).delete(discard_session))
        .route("/current/answer", post(answer))
        .route("/current/judgment", post(judgment))
        .route("/current/next", post(next_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionRequest {
    kind: StudyKind,
    mode: Mode,
}

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    index: usize,
}

#[derive(Debug, Deserialize)]
struct JudgmentRequest {
    knew: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscardResponse {
    discarded: bool,
}

async fn start_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .study()
        .start_session(&user.id, payload.kind, payload.mode)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(view))))
}

async fn current_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.study().current(&user.id)?;
    Ok(Json(SuccessResponse::new(view)))
}

async fn answer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .study()
        .submit(&user.id, StudyResponse::Choice { index: payload.index })
        .await?;
    Ok(Json(SuccessResponse::new(report)))
}

async fn judgment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<JudgmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .study()
        .submit(&user.id, StudyResponse::Judgment { knew: payload.knew })
        .await?;
    Ok(Json(SuccessResponse::new(report)))
}

async fn next_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.study().advance(&user.id)?;
    Ok(Json(SuccessResponse::new(view)))
}

async fn discard_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let discarded = state.study().discard(&user.id);
    if !discarded {
        return Err(StudyError::NoActiveSession.into());
    }
    Ok(Json(SuccessResponse::new(DiscardResponse { discarded })))
}
