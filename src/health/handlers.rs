//! Liveness and readiness endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::http::response::ErrorBody;
use crate::http::server::AppState;

pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str = "Upstream unavailable";

/// `GET /healthz`: the process is up and serving HTTP.
pub async fn liveness() -> &'static str {
    "ok"
}

/// `GET /readyz`: the upstream origin has answered the warm-up probe.
pub async fn readiness(State(state): State<AppState>) -> Response {
    match state.readiness.ensure().await {
        Ok(()) => "ready".into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody::new(UPSTREAM_UNAVAILABLE_MESSAGE),
        )
            .into_response(),
    }
}
