//! Metric counters (C9): fire-and-forget, append-only newline-delimited
//! JSON, one file per component per UTC day. A metrics write failure is
//! swallowed, never surfaced as an [`crate::error::Error`], observability
//! must never be able to fail the operation it's observing.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Timer,
}

#[derive(Debug, Clone, Serialize)]
struct MetricRecord<'a> {
    timestamp: String,
    kind: MetricKind,
    name: &'a str,
    value: f64,
    tags: Value,
}

fn metrics_dir() -> PathBuf {
    std::env::var("OPENCLAW_METRICS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            directories::BaseDirs::new()
                .map(|dirs| dirs.data_local_dir().join("openclaw").join("metrics"))
                .unwrap_or_else(|| PathBuf::from(".openclaw/metrics"))
        })
}

fn file_path(component: &str, now: DateTime<Utc>) -> PathBuf {
    metrics_dir().join(format!("{component}-{}.jsonl", now.format("%Y%m%d")))
}

fn record(component: &str, kind: MetricKind, name: &str, value: f64, tags: Value) {
    let now = crate::clock::now();
    let record = MetricRecord {
        timestamp: crate::clock::format_ts(now),
        kind,
        name,
        value,
        tags,
    };
    let Ok(line) = serde_json::to_string(&record) else { return };
    let path = file_path(component, now);
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = writeln!(file, "{line}");
    }
}

/// Increment a named counter by `value` (usually `1.0`).
pub fn counter(component: &str, name: &str, value: f64, tags: Value) {
    record(component, MetricKind::Counter, name, value, tags);
}

/// Record an instantaneous value (pool size, queue depth, ...).
pub fn gauge(component: &str, name: &str, value: f64, tags: Value) {
    record(component, MetricKind::Gauge, name, value, tags);
}

/// Record a duration in milliseconds.
pub fn timer(component: &str, name: &str, duration_ms: f64, tags: Value) {
    record(component, MetricKind::Timer, name, duration_ms, tags);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_appends_a_jsonl_line() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("OPENCLAW_METRICS_DIR", dir.path());
        counter("test-component", "requests_total", 1.0, Value::Null);
        let path = file_path("test-component", crate::clock::now());
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        std::env::remove_var("OPENCLAW_METRICS_DIR");
    }
}
