//! Security-event audit logging
//!
//! Every security-relevant decision is recorded as a [`SecurityEvent`] and
//! handed to an [`AuditSink`]. The sink is an external collaborator (log
//! aggregation); the default [`TracingSink`] forwards events to `tracing`
//! on a channel matching their severity, which keeps the request path
//! non-blocking. [`MemorySink`] retains a bounded buffer of recent events
//! and can summarize them for the admin dashboard.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::clock::{Clock, SystemClock};

/// Actor recorded when no authenticated identity is present.
const ANONYMOUS_ACTOR: &str = "anonymous";

/// Placeholder recorded outside a request context.
const UNKNOWN: &str = "unknown";

/// Event severity, mapped onto the sink's three channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Write-once audit record; never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub actor: String,
    pub source_address: String,
    pub user_agent: String,
    pub details: Value,
    pub severity: Severity,
}

/// Identity and address of the request being processed.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Authenticated identity, if any.
    pub actor: Option<String>,
    pub source_address: String,
    pub user_agent: String,
}

impl RequestContext {
    /// Context for a request from an authenticated caller.
    pub fn authenticated(
        actor: impl Into<String>,
        source_address: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            actor: Some(actor.into()),
            source_address: source_address.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Context for a request with no authenticated identity.
    pub fn anonymous(source_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            actor: None,
            source_address: source_address.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Context for code running outside any request (startup, jobs).
    pub fn outside_request() -> Self {
        Self::anonymous(UNKNOWN, UNKNOWN)
    }

    pub fn is_authenticated(&self) -> bool {
        self.actor.is_some()
    }

    /// The actor name as recorded in events.
    pub fn actor_or_anonymous(&self) -> &str {
        self.actor.as_deref().unwrap_or(ANONYMOUS_ACTOR)
    }
}

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &SecurityEvent);
}

/// Default sink: forwards events to `tracing` under the `security` target,
/// on the channel matching their severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn emit(&self, event: &SecurityEvent) {
        let details = event.details.to_string();
        match event.severity {
            Severity::Critical => tracing::error!(
                target: "security",
                event_type = %event.event_type,
                actor = %event.actor,
                ip = %event.source_address,
                user_agent = %event.user_agent,
                details = %details,
                "security event"
            ),
            Severity::Warning => tracing::warn!(
                target: "security",
                event_type = %event.event_type,
                actor = %event.actor,
                ip = %event.source_address,
                user_agent = %event.user_agent,
                details = %details,
                "security event"
            ),
            Severity::Info => tracing::info!(
                target: "security",
                event_type = %event.event_type,
                actor = %event.actor,
                ip = %event.source_address,
                user_agent = %event.user_agent,
                details = %details,
                "security event"
            ),
        }
    }
}

/// Counts of recent security activity within a trailing period.
#[derive(Debug, Clone, Serialize)]
pub struct SecuritySummary {
    pub events_by_type: BTreeMap<String, usize>,
    pub failed_logins: usize,
    pub total_events: usize,
}

/// Bounded in-memory sink retaining the most recent events.
///
/// Clones share the same buffer, so a clone handed to the [`AuditLogger`]
/// can still be inspected by the holder of the original.
#[derive(Clone)]
pub struct MemorySink {
    events: Arc<Mutex<VecDeque<SecurityEvent>>>,
    capacity: usize,
}

impl MemorySink {
    /// Retain at most `capacity` events, evicting the oldest first.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Snapshot of the retained events, oldest first.
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Summarize retained events with `timestamp >= since`.
    pub fn summary(&self, since: DateTime<Utc>) -> SecuritySummary {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let mut events_by_type = BTreeMap::new();
        let mut failed_logins = 0;
        let mut total_events = 0;

        for event in events.iter().filter(|e| e.timestamp >= since) {
            *events_by_type.entry(event.event_type.clone()).or_insert(0) += 1;
            if event.event_type == "LOGIN_FAILED" {
                failed_logins += 1;
            }
            total_events += 1;
        }

        SecuritySummary {
            events_by_type,
            failed_logins,
            total_events,
        }
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl AuditSink for MemorySink {
    fn emit(&self, event: &SecurityEvent) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

/// Assembles and emits [`SecurityEvent`]s.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl AuditLogger {
    /// Logger emitting to `tracing` with the system clock.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Logger emitting to a custom sink with the system clock.
    pub fn with_sink(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            clock: Arc::new(SystemClock),
        }
    }

    /// Logger with both sink and clock injected.
    pub fn with_clock(sink: Arc<dyn AuditSink>, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }

    /// Assemble an event from the request context and emit it.
    pub fn log_event(
        &self,
        ctx: &RequestContext,
        event_type: &str,
        details: Value,
        severity: Severity,
    ) {
        let event = SecurityEvent {
            timestamp: self.clock.now(),
            event_type: event_type.to_string(),
            actor: ctx.actor_or_anonymous().to_string(),
            source_address: ctx.source_address.clone(),
            user_agent: ctx.user_agent.clone(),
            details,
            severity,
        };
        self.sink.emit(&event);
    }

    /// Run `operation` under audit.
    ///
    /// Exactly one `AUDIT_LOG` event is emitted per invocation: on `Ok`
    /// with `status: "SUCCESS"`, on `Err` with `status: "FAILED"`, the
    /// error description and severity WARNING. The operation's result is
    /// returned unchanged either way; this wrapper never swallows a
    /// failure.
    pub async fn audited<T, E, Fut>(
        &self,
        ctx: &RequestContext,
        action: &str,
        resource_type: &str,
        resource_id: Option<&str>,
        details: Option<Value>,
        operation: Fut,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let started = Instant::now();
        let result = operation.await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(_) => self.log_event(
                ctx,
                "AUDIT_LOG",
                json!({
                    "action": action,
                    "resource_type": resource_type,
                    "resource_id": resource_id,
                    "details": details,
                    "duration_ms": duration_ms,
                    "status": "SUCCESS",
                }),
                Severity::Info,
            ),
            Err(error) => self.log_event(
                ctx,
                "AUDIT_LOG",
                json!({
                    "action": action,
                    "resource_type": resource_type,
                    "resource_id": resource_id,
                    "details": details,
                    "error": error.to_string(),
                    "duration_ms": duration_ms,
                    "status": "FAILED",
                }),
                Severity::Warning,
            ),
        }

        result
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}
