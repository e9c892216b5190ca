//! Scheduler implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::audit::{AuditEvent, AuditHandle};
use crate::dataset::{extract_archive, CsvCodec, DatasetCodec, ShapefileCodec};
use crate::geometry::GeometryBackend;
use crate::metrics;
use crate::pipeline::{self, Plan, ResourceKind, ResponseMode};
use crate::storage::OutputStore;
use crate::ticket::{CompletionUpdate, CreateTicketRequest, Ticket, TicketStore};

use super::config::{SchedulerConfig, TicketMode};
use super::types::{NormalizeJob, ProcessError, PromptOutcome, SchedulerError};

/// Dispatches normalization jobs and records their outcomes.
pub struct JobScheduler {
    config: SchedulerConfig,
    ticket_store: Arc<dyn TicketStore>,
    output_store: Arc<OutputStore>,
    geometry: Arc<dyn GeometryBackend>,
    audit: Option<AuditHandle>,
    permits: Arc<Semaphore>,
}

impl JobScheduler {
    pub fn new(
        config: SchedulerConfig,
        ticket_store: Arc<dyn TicketStore>,
        output_store: Arc<OutputStore>,
        geometry: Arc<dyn GeometryBackend>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        Self {
            config,
            ticket_store,
            output_store,
            geometry,
            audit: None,
            permits,
        }
    }

    /// Sets the audit handle for accounting events.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn ticket_mode(&self) -> TicketMode {
        self.config.ticket_mode
    }

    /// Submits a deferred job.
    ///
    /// The ticket row is inserted synchronously, so it is queryable as
    /// soon as this returns; execution happens later on the worker
    /// pool. Each call creates a fresh ticket and spawns exactly one
    /// job for it — there is no way to dispatch the same ticket twice.
    pub fn submit(&self, job: NormalizeJob) -> Result<Ticket, SchedulerError> {
        let ticket = self.ticket_store.create(CreateTicketRequest {
            filesize: job.filesize,
        })?;

        if let Some(audit) = &self.audit {
            audit.try_emit(AuditEvent::JobSubmitted {
                ticket_id: ticket.ticket.clone(),
                filesize: job.filesize,
                resource_kind: job.options.resource_kind.as_str().to_string(),
                response_mode: ResponseMode::Deferred.as_str().to_string(),
            });
        }
        metrics::JOBS_SUBMITTED
            .with_label_values(&[ResponseMode::Deferred.as_str()])
            .inc();

        info!(ticket = %ticket.ticket, "job submitted");

        tokio::spawn(Self::run_job(
            Arc::clone(&self.permits),
            ticket.clone(),
            job,
            Arc::clone(&self.ticket_store),
            Arc::clone(&self.output_store),
            Arc::clone(&self.geometry),
            self.audit.clone(),
        ));

        Ok(ticket)
    }

    /// Runs a prompt job inline and returns the stored artifact.
    ///
    /// Whether a ticket is recorded follows the configured
    /// [`TicketMode`]; when one is, its completion is written before
    /// this returns.
    pub async fn run_prompt(&self, job: NormalizeJob) -> Result<PromptOutcome, SchedulerError> {
        let ticket = match self.config.ticket_mode {
            TicketMode::All => Some(self.ticket_store.create(CreateTicketRequest {
                filesize: job.filesize,
            })?),
            TicketMode::DeferredOnly => None,
        };

        if let Some(audit) = &self.audit {
            if let Some(ticket) = &ticket {
                audit.try_emit(AuditEvent::JobSubmitted {
                    ticket_id: ticket.ticket.clone(),
                    filesize: job.filesize,
                    resource_kind: job.options.resource_kind.as_str().to_string(),
                    response_mode: ResponseMode::Prompt.as_str().to_string(),
                });
            }
        }
        metrics::JOBS_SUBMITTED
            .with_label_values(&[ResponseMode::Prompt.as_str()])
            .inc();

        let id = ticket
            .as_ref()
            .map(|t| t.ticket.clone())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let output_dir = match self.output_store.allocate(&id) {
            Ok(dir) => dir,
            Err(e) => {
                if let Some(ticket) = &ticket {
                    complete_ticket(
                        self.ticket_store.as_ref(),
                        self.audit.as_ref(),
                        ticket,
                        false,
                        Some(e.to_string()),
                        None,
                    );
                }
                return Err(e.into());
            }
        };

        let geometry = Arc::clone(&self.geometry);
        let blocking_job = job.clone();
        let blocking_dir = output_dir.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            execute_job(&blocking_job, &blocking_dir, geometry.as_ref())
        })
        .await;

        match outcome {
            Ok(Ok(artifact)) => {
                let locator = self.output_store.relative_locator(&artifact);
                let completed = ticket.as_ref().and_then(|t| {
                    complete_ticket(
                        self.ticket_store.as_ref(),
                        self.audit.as_ref(),
                        t,
                        true,
                        None,
                        locator,
                    )
                });
                Ok(PromptOutcome {
                    artifact,
                    ticket: completed,
                })
            }
            Ok(Err(e)) => {
                if let Some(ticket) = &ticket {
                    complete_ticket(
                        self.ticket_store.as_ref(),
                        self.audit.as_ref(),
                        ticket,
                        false,
                        Some(e.to_string()),
                        None,
                    );
                }
                Err(e.into())
            }
            Err(join_error) => {
                let message = format!("job terminated unexpectedly: {join_error}");
                if let Some(ticket) = &ticket {
                    complete_ticket(
                        self.ticket_store.as_ref(),
                        self.audit.as_ref(),
                        ticket,
                        false,
                        Some(message.clone()),
                        None,
                    );
                }
                Err(SchedulerError::Internal(message))
            }
        }
    }

    /// The worker side of one deferred job. All faults — including a
    /// panicking pipeline — end in a completion record; the pool
    /// survives everything.
    async fn run_job(
        permits: Arc<Semaphore>,
        ticket: Ticket,
        job: NormalizeJob,
        ticket_store: Arc<dyn TicketStore>,
        output_store: Arc<OutputStore>,
        geometry: Arc<dyn GeometryBackend>,
        audit: Option<AuditHandle>,
    ) {
        let _permit = match Arc::clone(&permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!(ticket = %ticket.ticket, "worker pool closed before job ran");
                return;
            }
        };

        let result = match output_store.allocate(&ticket.ticket) {
            Ok(output_dir) => {
                let blocking_job = job.clone();
                let blocking_dir = output_dir.clone();
                let blocking_geometry = Arc::clone(&geometry);
                match tokio::task::spawn_blocking(move || {
                    execute_job(&blocking_job, &blocking_dir, blocking_geometry.as_ref())
                })
                .await
                {
                    Ok(Ok(artifact)) => Ok(artifact),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(join_error) => Err(format!("job terminated unexpectedly: {join_error}")),
                }
            }
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(artifact) => {
                let locator = output_store.relative_locator(&artifact);
                complete_ticket(
                    ticket_store.as_ref(),
                    audit.as_ref(),
                    &ticket,
                    true,
                    None,
                    locator,
                );
                info!(ticket = %ticket.ticket, "job completed");
            }
            Err(message) => {
                error!(ticket = %ticket.ticket, error = %message, "job failed");
                complete_ticket(
                    ticket_store.as_ref(),
                    audit.as_ref(),
                    &ticket,
                    false,
                    Some(message),
                    None,
                );
            }
        }
    }
}

/// Loads, transforms, and stores one job's dataset. CPU-bound; runs
/// inside `spawn_blocking` on both the prompt and deferred paths.
pub fn execute_job(
    job: &NormalizeJob,
    output_dir: &Path,
    geometry: &dyn GeometryBackend,
) -> Result<PathBuf, ProcessError> {
    let codec = codec_for(&job.options);

    let input_root = match job.options.resource_kind {
        ResourceKind::Csv => job.src_file.clone(),
        ResourceKind::Shapefile => extract_archive(&job.src_file)?,
    };

    let dataset = codec.read(&input_root)?;
    let plan = Plan::from_options(&job.options)?;

    let result = pipeline::run(dataset, &plan, geometry);
    if !result.success {
        return Err(ProcessError::Pipeline(
            result
                .error
                .unwrap_or_else(|| "pipeline failed".to_string()),
        ));
    }
    let dataset = result
        .dataset
        .ok_or_else(|| ProcessError::Pipeline("pipeline produced no dataset".to_string()))?;

    let stem = output_stem(&job.src_file);
    let artifact = codec.write(&dataset, output_dir, &stem)?;
    Ok(artifact)
}

fn codec_for(options: &crate::pipeline::NormalizeOptions) -> Box<dyn DatasetCodec> {
    match options.resource_kind {
        ResourceKind::Csv => Box::new(CsvCodec::new(
            options
                .csv_delimiter
                .filter(|c| c.is_ascii())
                .map(|c| c as u8),
        )),
        ResourceKind::Shapefile => Box::new(ShapefileCodec::new()),
    }
}

/// `data.csv` → `data_normalized`, mirroring the stored artifact names
/// clients already expect.
fn output_stem(src_file: &Path) -> String {
    let base = src_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = base.split('.').next().unwrap_or("output");
    format!("{stem}_normalized")
}

fn execution_seconds(requested_time: DateTime<Utc>) -> f64 {
    (Utc::now() - requested_time).num_milliseconds().max(0) as f64 / 1000.0
}

/// Writes the one-and-only terminal update for a ticket and emits the
/// accounting event. Store failures are logged, never raised: a ticket
/// must not take the worker down with it.
fn complete_ticket(
    ticket_store: &dyn TicketStore,
    audit: Option<&AuditHandle>,
    ticket: &Ticket,
    success: bool,
    comment: Option<String>,
    result: Option<String>,
) -> Option<Ticket> {
    let execution_time = execution_seconds(ticket.requested_time);

    let completed = match ticket_store.complete(
        &ticket.ticket,
        CompletionUpdate {
            success,
            execution_time,
            comment: comment.clone(),
            result,
        },
    ) {
        Ok(updated) => Some(updated),
        Err(e) => {
            error!(ticket = %ticket.ticket, error = %e, "failed to record job completion");
            None
        }
    };

    if let Some(audit) = audit {
        audit.try_emit(AuditEvent::JobCompleted {
            ticket_id: ticket.ticket.clone(),
            success,
            execution_start: ticket.requested_time,
            execution_time,
            filesize: ticket.filesize,
            comment,
        });
    }

    let label = if success { "success" } else { "failure" };
    metrics::JOBS_COMPLETED.with_label_values(&[label]).inc();
    metrics::JOB_DURATION
        .with_label_values(&[label])
        .observe(execution_time);

    completed
}
