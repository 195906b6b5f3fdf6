//! Lenient extractor for `?delay=SECONDS&fail=1` testing directives.
//!
//! Repeated keys are allowed; the first occurrence of each one wins.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

use crudscope_core::SimulationDirective;

/// Never rejects: an unparseable query string yields a no-op directive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simulation(pub SimulationDirective);

#[async_trait]
impl<S> FromRequestParts<S> for Simulation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs = match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
            Ok(Query(pairs)) => pairs,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unparseable simulation query");
                Vec::new()
            }
        };
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        Ok(Simulation(SimulationDirective::parse(
            first("delay"),
            first("fail"),
        )))
    }
}
