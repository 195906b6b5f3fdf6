//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;

pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Read-only view of the registry; never mutates it.
pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
        body,
    )
        .into_response()
}
