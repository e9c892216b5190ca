//! Types for the scheduler module.

use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::DatasetError;
use crate::pipeline::{NormalizeOptions, OptionsError};
use crate::storage::StorageError;
use crate::ticket::{Ticket, TicketError};

/// One job handed to the scheduler: the saved upload plus its options.
#[derive(Debug, Clone)]
pub struct NormalizeJob {
    /// Path of the saved upload in scratch space.
    pub src_file: PathBuf,
    /// Size of the upload in bytes, recorded on the ticket.
    pub filesize: u64,
    /// Validated normalization options.
    pub options: NormalizeOptions,
}

/// Error type for submission itself. Faults during execution never
/// surface here; they land on the ticket.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("{0}")]
    Internal(String),
}

/// Any fault while executing one job. Captured at the job boundary and
/// recorded as the ticket's comment; never crosses the worker pool.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("{0}")]
    Pipeline(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Outcome of a synchronous (prompt) run.
#[derive(Debug)]
pub struct PromptOutcome {
    /// Path of the stored artifact to stream back.
    pub artifact: PathBuf,
    /// The ticket recorded for this job, when the ticket mode records
    /// prompt jobs.
    pub ticket: Option<Ticket>,
}
