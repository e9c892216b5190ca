//! Configuration for the scheduler module.

use serde::{Deserialize, Serialize};

/// When a durable ticket record is created.
///
/// The primary deployment records a ticket for every job; the
/// alternative only records deferred jobs and treats prompt jobs as
/// fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketMode {
    #[default]
    All,
    DeferredOnly,
}

/// Configuration for the job scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum deferred jobs executing concurrently.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Ticket creation policy.
    #[serde(default)]
    pub ticket_mode: TicketMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            ticket_mode: TicketMode::default(),
        }
    }
}

fn default_max_concurrent_jobs() -> usize {
    4
}
