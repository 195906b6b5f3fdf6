//! Outcome code resolution for a finished handler invocation.

use crudscope_core::CrudError;

use super::reply::Reply;

/// Code attributed to a failure that carries no status of its own.
pub const UNEXPECTED_CODE: u16 = 500;

/// Resolve the single outcome code for a handler result.
///
/// Replies report their own code (200 by default); expected errors report the
/// status they carry; anything else is 500. Errors are only inspected, never
/// consumed.
pub fn resolve(result: &Result<Reply, CrudError>) -> u16 {
    match result {
        Ok(reply) => reply.outcome_code(),
        Err(err) => err.status().unwrap_or(UNEXPECTED_CODE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::json;

    #[test]
    fn plain_body_defaults_to_200() {
        assert_eq!(resolve(&Ok(Reply::Body(json!([])))), 200);
    }

    #[test]
    fn explicit_code_wins() {
        assert_eq!(resolve(&Ok(Reply::WithCode(json!({"id": 1}), 201))), 201);
        assert_eq!(resolve(&Ok(Reply::WithCode(json!(null), 204))), 204);
    }

    #[test]
    fn response_status_is_used() {
        let resp = StatusCode::ACCEPTED.into_response();
        assert_eq!(resolve(&Ok(Reply::Response(resp))), 202);
    }

    #[test]
    fn errors_resolve_by_kind() {
        assert_eq!(resolve(&Err(CrudError::NotFound)), 404);
        assert_eq!(resolve(&Err(CrudError::status_error(418, "teapot"))), 418);
        assert_eq!(resolve(&Err(CrudError::SimulatedFailure)), 500);
        assert_eq!(resolve(&Err(CrudError::Internal("db gone".into()))), 500);
    }
}
