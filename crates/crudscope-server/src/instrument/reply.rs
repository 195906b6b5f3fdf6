use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// What an instrumented handler hands back on success.
#[derive(Debug)]
pub enum Reply {
    /// JSON body, status 200.
    Body(Value),
    /// JSON body with an explicit status. `Value::Null` renders an empty body.
    WithCode(Value, u16),
    /// A fully built response; its own status is authoritative.
    Response(Response),
}

impl Reply {
    /// Outcome code this reply should be recorded under.
    pub fn outcome_code(&self) -> u16 {
        match self {
            Reply::Body(_) => 200,
            Reply::WithCode(_, code) => *code,
            Reply::Response(resp) => resp.status().as_u16(),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Body(body) => Json(body).into_response(),
            Reply::WithCode(body, code) => {
                let status =
                    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if body.is_null() {
                    status.into_response()
                } else {
                    (status, Json(body)).into_response()
                }
            }
            Reply::Response(resp) => resp,
        }
    }
}
