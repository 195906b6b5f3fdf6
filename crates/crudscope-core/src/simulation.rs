//! Request-scoped testing directives (artificial latency, forced failure).
//!
//! Parsing is deliberately lenient: a malformed delay is treated as no delay
//! and never fails the request.

use std::time::Duration;

/// Per-request directive consumed before the real handler runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationDirective {
    pub delay: Option<Duration>,
    pub force_failure: bool,
}

impl SimulationDirective {
    /// Parse raw `delay` (decimal seconds) and `fail` (any non-empty value) inputs.
    pub fn parse(delay: Option<&str>, fail: Option<&str>) -> Self {
        Self {
            delay: delay.and_then(parse_delay),
            force_failure: fail.is_some_and(|v| !v.is_empty()),
        }
    }

    /// Clamp the delay to `max`.
    pub fn capped(mut self, max: Duration) -> Self {
        self.delay = self.delay.map(|d| d.min(max));
        self
    }

    /// True when the directive changes nothing about the request.
    pub fn is_noop(&self) -> bool {
        self.delay.is_none() && !self.force_failure
    }
}

fn parse_delay(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let secs = match raw.parse::<f64>() {
        Ok(secs) => secs,
        Err(e) => {
            tracing::debug!(raw, error = %e, "ignoring malformed delay directive");
            return None;
        }
    };
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Some(d),
        Ok(_) => None,
        Err(_) => {
            tracing::debug!(raw, "ignoring out-of-range delay directive");
            None
        }
    }
}
