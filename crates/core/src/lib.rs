pub mod audit;
pub mod config;
pub mod dataset;
pub mod geometry;
pub mod metrics;
pub mod pipeline;
pub mod scheduler;
pub mod storage;
pub mod ticket;
pub mod transforms;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    ServerConfig, StorageConfig,
};
pub use dataset::{CsvCodec, Dataset, DatasetCodec, DatasetError, ShapefileCodec};
pub use geometry::{GeometryBackend, WktBackend};
pub use pipeline::{
    NormalizeOptions, OptionsError, Plan, PipelineResult, ResourceKind, ResponseMode,
};
pub use scheduler::{
    JobScheduler, NormalizeJob, ProcessError, PromptOutcome, SchedulerConfig, SchedulerError,
    TicketMode,
};
pub use storage::{OutputStore, ScratchDir, StorageError};
pub use ticket::{
    CompletionUpdate, CreateTicketRequest, SqliteTicketStore, Ticket, TicketError, TicketStatus,
    TicketStore,
};
