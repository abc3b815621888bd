use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::{authenticate, AuthUser};
use crate::response::AppError;
use crate::state::AppState;

/// Resolves the learner for `/api` routes and stores it as an `AuthUser` extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if state.config().local_mode {
        req.extensions_mut().insert(AuthUser::local());
        return next.run(req).await;
    }

    match authenticate(req.headers(), state.config().jwt_secret.as_deref()) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, path = %req.uri().path(), "rejected unauthenticated request");
            AppError::from(err).into_response()
        }
    }
}
