use std::sync::Arc;

use scrub_core::{
    AuditHandle, Config, JobScheduler, OutputStore, ScratchDir, TicketStore,
};

/// Shared application state, constructed once at startup and injected
/// into every handler.
pub struct AppState {
    config: Config,
    ticket_store: Arc<dyn TicketStore>,
    scheduler: Arc<JobScheduler>,
    output_store: Arc<OutputStore>,
    scratch: ScratchDir,
    audit: AuditHandle,
}

impl AppState {
    pub fn new(
        config: Config,
        ticket_store: Arc<dyn TicketStore>,
        scheduler: Arc<JobScheduler>,
        output_store: Arc<OutputStore>,
        scratch: ScratchDir,
        audit: AuditHandle,
    ) -> Self {
        Self {
            config,
            ticket_store,
            scheduler,
            output_store,
            scratch,
            audit,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.ticket_store.as_ref()
    }

    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    pub fn output_store(&self) -> &OutputStore {
        &self.output_store
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }
}
