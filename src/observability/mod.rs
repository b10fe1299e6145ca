//! Structured, trace/span-correlated event logging.
//!
//! One user turn is one trace. Every sub-operation (guard check, model
//! call, final reply) is a span whose `parent_span_id` points at the
//! turn's `request` span. Each event becomes one [`LogRecord`], written as
//! a single JSON line to the [`EventLog`] sink, which is what external
//! dashboards read.
//!
//! The sink is best-effort: a failed write is reported through `tracing`
//! and never changes the outcome of a turn.

pub mod metrics;
pub mod traced;

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;

pub use metrics::{Metrics, MetricsSnapshot};
pub use traced::TracedLlm;

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Fresh trace id (UUID v4, hyphenated).
pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fresh span id (first 8 hex chars of a UUID v4).
pub fn new_span_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Position of one span in a trace tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
}

impl SpanContext {
    /// Root span of a new trace.
    pub fn root() -> Self {
        Self { trace_id: new_trace_id(), span_id: new_span_id(), parent_span_id: None }
    }

    /// New span in the same trace, parented to `self`.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_span_id(),
            parent_span_id: Some(self.span_id.clone()),
        }
    }
}

// ── Records ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// One logged event. Every field is always present in the JSON output so
/// each line can be aggregated on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub role: Role,
    pub message: String,
    pub tool: Option<String>,
    pub latency_ms: f64,
    pub tokens_used: u64,
    pub status: Status,
}

impl LogRecord {
    /// Record for `span` with zero latency, zero tokens and `ok` status.
    pub fn new(span: &SpanContext, role: Role, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            trace_id: span.trace_id.clone(),
            span_id: span.span_id.clone(),
            parent_span_id: span.parent_span_id.clone(),
            role,
            message: message.into(),
            tool: None,
            latency_ms: 0.0,
            tokens_used: 0,
            status: Status::Ok,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = latency.as_secs_f64() * 1000.0;
        self
    }

    /// Set the token count; `None` keeps the current value.
    pub fn with_tokens(mut self, tokens: Option<u64>) -> Self {
        if let Some(t) = tokens {
            self.tokens_used = t;
        }
        self
    }

    pub fn failed(mut self) -> Self {
        self.status = Status::Error;
        self
    }
}

/// Token count to log when the provider reports no usage.
///
/// A rough `chars / 4` heuristic with a floor of 20; not a measurement.
pub fn estimate_tokens(text: &str) -> u64 {
    ((text.chars().count() / 4) as u64).max(20)
}

// ── Sink ─────────────────────────────────────────────────────────────────────

/// Append-only JSONL sink.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    /// Sink writing to `path`; parent directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` as one JSON line and mirror it to `tracing`.
    pub fn log_event(&self, record: &LogRecord) {
        info!(
            trace_id = %record.trace_id,
            span_id = %record.span_id,
            parent_span_id = ?record.parent_span_id,
            role = ?record.role,
            tool = ?record.tool,
            latency_ms = record.latency_ms,
            tokens_used = record.tokens_used,
            status = ?record.status,
            "{}",
            record.message
        );
        if let Err(e) = self.append(record) {
            warn!(path = %self.path.display(), error = %e, "event log write failed");
        }
    }

    fn append(&self, record: &LogRecord) -> Result<(), AppError> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
        line.push('\n');
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        // One write call per record keeps lines whole.
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Read back every parseable record from a JSONL event log.
///
/// Lines that are not valid records are skipped. A missing file reads as empty.
pub fn read_records(path: &Path) -> Result<Vec<LogRecord>, AppError> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Ok(record) = serde_json::from_str::<LogRecord>(&line) {
            records.push(record);
        }
    }
    Ok(records)
}
