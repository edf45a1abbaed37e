// crates/batch-gate-core/src/runtime/audit.rs
// ============================================================================
// Module: Batch Gate Audit Logging
// Description: Structured audit events for batch sessions and reentry.
// Purpose: Emit JSON-line audit records without a logging framework dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The engine records one event per session transition, per completed call,
//! and per reentry decision. Sinks are intentionally lightweight so hosts can
//! route events to their preferred pipeline. Payload bytes are never logged;
//! only identities, positions, and outcome labels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::Address;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Session opened by the outer entry point.
pub const EVENT_BATCH_OPENED: &str = "batch_opened";
/// Session closed by the outer entry point.
pub const EVENT_BATCH_CLOSED: &str = "batch_closed";
/// A dispatched call returned (successfully or not).
pub const EVENT_CALL_COMPLETED: &str = "call_completed";
/// The reentry gate accepted a callback.
pub const EVENT_REENTRY_ACCEPTED: &str = "reentry_accepted";
/// The reentry gate rejected a callback.
pub const EVENT_REENTRY_REJECTED: &str = "reentry_rejected";

/// Batch audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Initiator of the open session, if any.
    pub initiator: Option<String>,
    /// Nesting depth at which the event occurred.
    pub depth: usize,
    /// Step index when the event concerns a call.
    pub index: Option<usize>,
    /// Call target or reentering caller.
    pub target: Option<String>,
    /// Outcome label (`ok`, `suppressed`, `failed`, `rejected`).
    pub outcome: &'static str,
    /// Error kind label when the outcome is not `ok`.
    pub error_kind: Option<&'static str>,
}

/// Inputs required to construct a batch audit event.
pub struct BatchAuditEventParams<'a> {
    /// Event identifier.
    pub event: &'static str,
    /// Initiator of the open session, if any.
    pub initiator: Option<&'a Address>,
    /// Nesting depth.
    pub depth: usize,
    /// Step index, if any.
    pub index: Option<usize>,
    /// Call target or reentering caller, if any.
    pub target: Option<&'a Address>,
    /// Outcome label.
    pub outcome: &'static str,
    /// Error kind label.
    pub error_kind: Option<&'static str>,
}

impl BatchAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: BatchAuditEventParams<'_>) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: params.event,
            timestamp_ms,
            initiator: params.initiator.map(ToString::to_string),
            depth: params.depth,
            index: params.index,
            target: params.target.map(ToString::to_string),
            outcome: params.outcome,
            error_kind: params.error_kind,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for batch engine events.
pub trait BatchAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &BatchAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl BatchAuditSink for StderrAuditSink {
    fn record(&self, event: &BatchAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl BatchAuditSink for FileAuditSink {
    fn record(&self, event: &BatchAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl BatchAuditSink for NoopAuditSink {
    fn record(&self, _event: &BatchAuditEvent) {}
}

/// Audit sink that keeps events in memory for tests and demos.
#[derive(Default)]
pub struct InMemoryAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<BatchAuditEvent>>,
}

impl InMemoryAuditSink {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<BatchAuditEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl BatchAuditSink for InMemoryAuditSink {
    fn record(&self, event: &BatchAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}
