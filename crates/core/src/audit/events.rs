use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Job lifecycle
    JobSubmitted {
        ticket_id: String,
        filesize: u64,
        resource_kind: String,
        response_mode: String,
    },
    /// The accounting record for one finished job: outcome, wall-clock
    /// execution time, and failure detail when there is one.
    JobCompleted {
        ticket_id: String,
        success: bool,
        execution_start: DateTime<Utc>,
        execution_time: f64,
        filesize: u64,
        comment: Option<String>,
    },
}

impl AuditEvent {
    /// Machine-readable event type for indexing.
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::ServiceStarted { .. } => "service_started",
            AuditEvent::ServiceStopped { .. } => "service_stopped",
            AuditEvent::JobSubmitted { .. } => "job_submitted",
            AuditEvent::JobCompleted { .. } => "job_completed",
        }
    }

    /// Ticket this event belongs to, if any.
    pub fn ticket_id(&self) -> Option<&str> {
        match self {
            AuditEvent::ServiceStarted { .. } | AuditEvent::ServiceStopped { .. } => None,
            AuditEvent::JobSubmitted { ticket_id, .. } => Some(ticket_id),
            AuditEvent::JobCompleted { ticket_id, .. } => Some(ticket_id),
        }
    }
}

/// A stored audit event with its assigned id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub ticket_id: Option<String>,
    pub data: AuditEvent,
}
