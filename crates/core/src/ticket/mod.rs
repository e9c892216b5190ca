//! Ticket system for tracking normalization jobs and their outcomes.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub use store::{CompletionUpdate, CreateTicketRequest, TicketError, TicketStore};
pub use types::{Ticket, TicketStatus};
