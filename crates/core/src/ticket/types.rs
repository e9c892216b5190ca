//! Core ticket data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a ticket. A ticket never leaves `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    Completed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Completed => "completed",
        }
    }
}

/// Durable record of one normalization job.
///
/// `requested_time` and `filesize` are set at creation and never change.
/// The terminal fields (`success`, `execution_time`, `comment`,
/// `result`) are written exactly once, together, when the job completes;
/// `result` is a locator relative to the output root and is only present
/// for successful jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket: String,
    pub requested_time: DateTime<Utc>,
    pub filesize: u64,
    pub status: TicketStatus,
    pub success: Option<bool>,
    /// Wall-clock seconds between completion and `requested_time`,
    /// rounded to milliseconds.
    pub execution_time: Option<f64>,
    pub comment: Option<String>,
    pub result: Option<String>,
}

impl Ticket {
    pub fn is_completed(&self) -> bool {
        self.status == TicketStatus::Completed
    }
}
