use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrub_core::{
    create_audit_system, load_config, validate_config, AuditEvent, AuditStore, JobScheduler,
    OutputStore, ScratchDir, SqliteAuditStore, SqliteTicketStore, TicketStore, WktBackend,
};

use scrub_server::api::create_router;
use scrub_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for audit event channel
const AUDIT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SCRUB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Output directory: {:?}", config.storage.output_dir);

    // Compute config hash for audit
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Create SQLite audit store
    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    info!("Audit store initialized");

    // Create SQLite ticket store
    let ticket_store: Arc<dyn TicketStore> = Arc::new(
        SqliteTicketStore::new(&config.database.path).context("Failed to create ticket store")?,
    );
    info!("Ticket store initialized");

    // Create audit system and spawn the writer task
    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), AUDIT_BUFFER_SIZE);
    let writer_handle = tokio::spawn(audit_writer.run());

    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;

    // Storage
    let output_store = Arc::new(OutputStore::new(&config.storage.output_dir));
    let scratch = ScratchDir::new(&config.storage.scratch_dir);
    scratch
        .check_writable()
        .context("Scratch directory is not writable")?;

    // Job scheduler
    let scheduler = Arc::new(
        JobScheduler::new(
            config.scheduler.clone(),
            Arc::clone(&ticket_store),
            Arc::clone(&output_store),
            Arc::new(WktBackend),
        )
        .with_audit(audit_handle.clone()),
    );
    info!(
        "Job scheduler started ({} workers, ticket mode {:?})",
        config.scheduler.max_concurrent_jobs, config.scheduler.ticket_mode
    );

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        ticket_store,
        scheduler,
        output_store,
        scratch,
        audit_handle.clone(),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Emit ServiceStopped event
    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // Drop all holders of AuditHandle so the writer's channel closes.
    // The final event must be emitted BEFORE the handles go away.
    drop(audit_handle);

    // Wait for writer to finish processing remaining events
    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
