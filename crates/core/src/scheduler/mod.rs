//! Job scheduler and executor.
//!
//! Owns the ticket lifecycle: submitted → running (implicit) →
//! completed. Deferred jobs go through a bounded worker pool; prompt
//! jobs run inline on the caller. Every ticket is executed at most
//! once: `submit` is the only dispatch path and each call creates a
//! fresh ticket.

mod config;
mod executor;
mod types;

pub use config::{SchedulerConfig, TicketMode};
pub use executor::{execute_job, JobScheduler};
pub use types::{NormalizeJob, ProcessError, PromptOutcome, SchedulerError};
