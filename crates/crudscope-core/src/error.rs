//! Shared error type across crudscope crates.
//!
//! Failures fall in two kinds. Expected errors carry the status code they
//! should be reported with (`NotFound` is 404, an injected failure is 500).
//! Unexpected errors carry none and are always attributed 500.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Requested record does not exist.
    NotFound,
    /// Invalid input / malformed body.
    BadRequest,
    /// Failure forced through a simulation directive.
    SimulatedFailure,
    /// Any other explicit HTTP-style status.
    HttpError,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::SimulatedFailure => "SIMULATED_FAILURE",
            ClientCode::HttpError => "HTTP_ERROR",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CrudError>;

/// Unified error type used by handlers, the store, and the interceptor.
#[derive(Debug, Error)]
pub enum CrudError {
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("simulated failure")]
    SimulatedFailure,
    #[error("internal: {0}")]
    Internal(String),
}

impl CrudError {
    /// Build an expected error with an arbitrary status code.
    pub fn status_error(status: u16, message: impl Into<String>) -> Self {
        CrudError::Status {
            status,
            message: message.into(),
        }
    }

    /// Status carried by an expected error; `None` for unexpected failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            CrudError::NotFound => Some(404),
            CrudError::BadRequest(_) => Some(400),
            CrudError::Status { status, .. } => Some(*status),
            CrudError::SimulatedFailure => Some(500),
            CrudError::Internal(_) => None,
        }
    }

    /// Whether this error carries its own status code.
    pub fn is_expected(&self) -> bool {
        self.status().is_some()
    }

    /// Outcome code to attribute to a request that failed with this error.
    pub fn outcome_code(&self) -> u16 {
        self.status().unwrap_or(500)
    }

    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            CrudError::NotFound => ClientCode::NotFound,
            CrudError::BadRequest(_) => ClientCode::BadRequest,
            CrudError::Status { .. } => ClientCode::HttpError,
            CrudError::SimulatedFailure => ClientCode::SimulatedFailure,
            CrudError::Internal(_) => ClientCode::Internal,
        }
    }
}
