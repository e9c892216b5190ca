//! Ticket storage trait and request types.

use thiserror::Error;

use super::Ticket;

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Ticket not found.
    #[error("Ticket not found: {0}")]
    NotFound(String),

    /// The ticket already holds a terminal outcome.
    #[error("Ticket already completed: {0}")]
    AlreadyCompleted(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a new ticket.
#[derive(Debug, Clone)]
pub struct CreateTicketRequest {
    /// Size of the uploaded file in bytes.
    pub filesize: u64,
}

/// The terminal fields of a ticket, written together exactly once.
#[derive(Debug, Clone)]
pub struct CompletionUpdate {
    pub success: bool,
    /// Seconds between completion and the request, rounded to
    /// milliseconds.
    pub execution_time: f64,
    /// Failure detail; `None` for successful jobs.
    pub comment: Option<String>,
    /// Output locator relative to the output root; only set on success.
    pub result: Option<String>,
}

/// Trait for ticket storage backends.
pub trait TicketStore: Send + Sync {
    /// Creates a new pending ticket with a fresh identifier.
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError>;

    /// Gets a ticket by identifier.
    fn get(&self, ticket: &str) -> Result<Option<Ticket>, TicketError>;

    /// Writes the terminal fields and marks the ticket completed, in one
    /// atomic update. Fails with [`TicketError::AlreadyCompleted`] when
    /// the ticket already left `pending`.
    fn complete(&self, ticket: &str, update: CompletionUpdate) -> Result<Ticket, TicketError>;

    /// Cheap reachability probe for health checks.
    fn ping(&self) -> Result<(), TicketError>;
}
