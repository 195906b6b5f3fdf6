//! crudscope core: transport-agnostic error taxonomy and simulation directives.
//!
//! This crate defines the outcome vocabulary shared by the HTTP server and its
//! tests: which failures carry their own status code, which ones are
//! unexpected, and how request-scoped testing directives are parsed. It
//! intentionally carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod simulation;

/// Shared result type.
pub use error::{CrudError, Result};
pub use simulation::SimulationDirective;
