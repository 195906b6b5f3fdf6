//! Request metrics registry for the server.
//!
//! Counter and histogram families with fixed, ordered label names. Each
//! distinct combination of label values is one series, stored in a `DashMap`
//! and created lazily through the entry API so concurrent first observations
//! converge on a single series. Series are never removed.
//!
//! Histogram buckets are fixed in microseconds to avoid floating point math on
//! the hot path; bounds and sums are rendered in seconds.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Requests taking at least this long are counted as slow.
pub const SLOW_THRESHOLD: Duration = Duration::from_secs(5);

// 5ms, 10ms, 50ms, 100ms, 500ms, 1s, 2s, 5s
pub const DURATION_BUCKETS: &[u64] = &[
    5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000, 2_000_000, 5_000_000,
];

// Default client-library buckets: 5ms .. 10s
pub const LAST_DURATION_BUCKETS: &[u64] = &[
    5_000, 10_000, 25_000, 50_000, 75_000, 100_000, 250_000, 500_000, 750_000, 1_000_000,
    2_500_000, 5_000_000, 7_500_000, 10_000_000,
];

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn micros_to_secs(micros: u64) -> f64 {
    micros as f64 / 1_000_000.0
}

fn label_pairs(names: &[&str], values: &[String]) -> String {
    names
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn series_key(names: &[&str], values: &[&str]) -> Vec<String> {
    debug_assert_eq!(names.len(), values.len(), "label arity mismatch");
    values.iter().map(|v| v.to_string()).collect()
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, escape_help(help));
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

pub struct CounterVec {
    name: &'static str,
    help: &'static str,
    labels: &'static [&'static str],
    map: DashMap<Vec<String>, AtomicU64>,
}

impl CounterVec {
    pub fn new(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> Self {
        Self {
            name,
            help,
            labels,
            map: DashMap::new(),
        }
    }

    /// Increment by 1.
    pub fn inc(&self, values: &[&str]) {
        self.add(values, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, values: &[&str], v: u64) {
        let key = series_key(self.labels, values);
        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value of one series (0 if it was never touched).
    pub fn get(&self, values: &[&str]) -> u64 {
        let key = series_key(self.labels, values);
        self.map
            .get(&key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Number of distinct series created so far.
    pub fn series_count(&self) -> usize {
        self.map.len()
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "counter");
        let mut rows: Vec<(Vec<String>, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (key, val) in rows {
            let _ = writeln!(out, "{}{{{}}} {}", self.name, label_pairs(self.labels, &key), val);
        }
    }
}

struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: Box<[AtomicU64]>,
}

impl AtomicHistogram {
    fn new(n: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            buckets: (0..n).map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

/// Point-in-time copy of one histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum_micros: u64,
    /// `(upper bound in seconds, cumulative count)`, ascending.
    pub buckets: Vec<(f64, u64)>,
}

impl HistogramSnapshot {
    pub fn sum_secs(&self) -> f64 {
        micros_to_secs(self.sum_micros)
    }
}

pub struct HistogramVec {
    name: &'static str,
    help: &'static str,
    labels: &'static [&'static str],
    bounds: &'static [u64],
    map: DashMap<Vec<String>, AtomicHistogram>,
}

impl HistogramVec {
    /// `bounds` are ascending upper bounds in microseconds.
    pub fn new(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
        bounds: &'static [u64],
    ) -> Self {
        debug_assert!(bounds.windows(2).all(|w| w[0] < w[1]), "bounds must ascend");
        Self {
            name,
            help,
            labels,
            bounds,
            map: DashMap::new(),
        }
    }

    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, values: &[&str], duration: Duration) {
        let key = series_key(self.labels, values);
        let n = self.bounds.len();
        let hist = self.map.entry(key).or_insert_with(|| AtomicHistogram::new(n));
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Release);
        hist.sum.fetch_add(micros, Ordering::Release);

        // Cumulative: every bucket whose bound is >= the value.
        for (i, &b) in self.bounds.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Release);
            }
        }
    }

    pub fn snapshot(&self, values: &[&str]) -> Option<HistogramSnapshot> {
        let key = series_key(self.labels, values);
        let hist = self.map.get(&key)?;
        Some(self.snapshot_of(&hist))
    }

    fn snapshot_of(&self, hist: &AtomicHistogram) -> HistogramSnapshot {
        // `observe` bumps count before buckets; reading in the reverse order
        // keeps every finite bucket <= the +Inf count.
        let buckets: Vec<(f64, u64)> = self
            .bounds
            .iter()
            .zip(hist.buckets.iter())
            .map(|(&b, c)| (micros_to_secs(b), c.load(Ordering::Acquire)))
            .collect();
        let sum_micros = hist.sum.load(Ordering::Acquire);
        let count = hist.count.load(Ordering::Acquire);
        HistogramSnapshot {
            count,
            sum_micros,
            buckets,
        }
    }

    /// Render in Prometheus text exposition format (unit: seconds).
    fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "histogram");
        let mut rows: Vec<(Vec<String>, HistogramSnapshot)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), self.snapshot_of(r.value())))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, snap) in rows {
            let label_str = label_pairs(self.labels, &key);
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{},", label_str)
            };

            for (le, count) in &snap.buckets {
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", self.name, prefix, le, count);
            }
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", self.name, prefix, snap.count);
            let _ = writeln!(out, "{}_sum{{{}}} {}", self.name, label_str, snap.sum_secs());
            let _ = writeln!(out, "{}_count{{{}}} {}", self.name, label_str, snap.count);
        }
    }
}

/// Outcome of one instrumented request. Produced once, consumed by `record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome<'a> {
    pub method: &'a str,
    pub route: &'a str,
    pub code: u16,
}

pub struct HttpMetrics {
    pub requests: CounterVec,
    pub duration: HistogramVec,
    pub errors: CounterVec,
    pub slow: CounterVec,
    pub last_duration: HistogramVec,
}

impl Default for HttpMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self {
            requests: CounterVec::new(
                "http_requests_total",
                "Total HTTP requests",
                &["method", "route", "code"],
            ),
            duration: HistogramVec::new(
                "http_request_duration_seconds",
                "HTTP request duration",
                &["method", "route", "code"],
                DURATION_BUCKETS,
            ),
            errors: CounterVec::new(
                "http_errors_total",
                "Total HTTP error responses (>=500)",
                &["method", "route", "code"],
            ),
            slow: CounterVec::new(
                "http_slow_requests_total",
                "Number of requests exceeding slow threshold (seconds)",
                &["method", "route"],
            ),
            last_duration: HistogramVec::new(
                "http_last_request_duration_seconds",
                "Last request duration seconds",
                &["method", "route"],
                LAST_DURATION_BUCKETS,
            ),
        }
    }

    /// Fold one finished request into every family.
    ///
    /// Synchronous and non-suspending: once entered, all applicable updates
    /// are applied before control returns to the caller.
    pub fn record(&self, outcome: &RequestOutcome<'_>, elapsed: Duration) {
        let code = outcome.code.to_string();
        let full = [outcome.method, outcome.route, code.as_str()];
        let short = [outcome.method, outcome.route];

        self.requests.inc(&full);
        self.duration.observe(&full, elapsed);
        self.last_duration.observe(&short, elapsed);
        if outcome.code >= 500 {
            self.errors.inc(&full);
        }
        if elapsed >= SLOW_THRESHOLD {
            self.slow.inc(&short);
        }
    }

    /// Render all registered families.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.requests.render(&mut out);
        self.duration.render(&mut out);
        self.errors.render(&mut out);
        self.slow.render(&mut out);
        self.last_duration.render(&mut out);
        out
    }
}
