//! HTTP rendering of [`CrudError`] for client-visible responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crudscope_core::CrudError;

/// Newtype so axum can turn a core error into a response.
#[derive(Debug)]
pub struct ApiError(pub CrudError);

impl From<CrudError> for ApiError {
    fn from(e: CrudError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.outcome_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
