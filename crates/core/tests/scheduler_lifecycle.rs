//! Scheduler lifecycle tests: ticket states, at-most-once execution,
//! failure containment.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use scrub_core::pipeline::{NormalizeOptions, ResourceKind};
use scrub_core::scheduler::{JobScheduler, NormalizeJob, SchedulerConfig, TicketMode};
use scrub_core::{
    OutputStore, SqliteTicketStore, Ticket, TicketStatus, TicketStore, WktBackend,
};

struct Fixture {
    scheduler: JobScheduler,
    ticket_store: Arc<SqliteTicketStore>,
    output_store: Arc<OutputStore>,
    _temp: tempfile::TempDir,
    upload_dir: PathBuf,
}

fn fixture(config: SchedulerConfig) -> Fixture {
    let temp = tempfile::tempdir().unwrap();
    let output_root = temp.path().join("output");
    std::fs::create_dir_all(&output_root).unwrap();
    let upload_dir = temp.path().join("uploads");
    std::fs::create_dir_all(&upload_dir).unwrap();

    let ticket_store = Arc::new(SqliteTicketStore::in_memory().unwrap());
    let output_store = Arc::new(OutputStore::new(&output_root));

    let scheduler = JobScheduler::new(
        config,
        Arc::clone(&ticket_store) as Arc<dyn TicketStore>,
        Arc::clone(&output_store),
        Arc::new(WktBackend),
    );

    Fixture {
        scheduler,
        ticket_store,
        output_store,
        _temp: temp,
        upload_dir,
    }
}

fn write_upload(dir: &std::path::Path, content: &str) -> (PathBuf, u64) {
    let path = dir.join("data.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    let filesize = std::fs::metadata(&path).unwrap().len();
    (path, filesize)
}

fn case_job(src_file: PathBuf, filesize: u64) -> NormalizeJob {
    let mut options = NormalizeOptions::new(ResourceKind::Csv);
    options.case_normalization = vec!["name".to_string()];
    NormalizeJob {
        src_file,
        filesize,
        options,
    }
}

async fn wait_for_completion(store: &SqliteTicketStore, id: &str) -> Ticket {
    for _ in 0..200 {
        let ticket = store.get(id).unwrap().unwrap();
        if ticket.is_completed() {
            return ticket;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("ticket {id} never completed");
}

#[tokio::test]
async fn test_ticket_queryable_immediately_after_submit() {
    let f = fixture(SchedulerConfig::default());
    let (path, filesize) = write_upload(&f.upload_dir, "name\nAlpha\n");

    let ticket = f.scheduler.submit(case_job(path, filesize)).unwrap();

    // Queryable before any worker touched it; either still pending or
    // already done, but never missing.
    let fetched = f.ticket_store.get(&ticket.ticket).unwrap();
    assert!(fetched.is_some());
    assert_eq!(ticket.status, TicketStatus::Pending);
    assert_eq!(ticket.filesize, filesize);
}

#[tokio::test]
async fn test_deferred_job_success() {
    let f = fixture(SchedulerConfig::default());
    let (path, filesize) = write_upload(&f.upload_dir, "name\nAlpha\nBeta\n");

    let ticket = f.scheduler.submit(case_job(path, filesize)).unwrap();
    let completed = wait_for_completion(&f.ticket_store, &ticket.ticket).await;

    assert_eq!(completed.success, Some(true));
    assert!(completed.execution_time.unwrap() >= 0.0);
    assert!(completed.comment.is_none());

    // The stored locator resolves to a real artifact.
    let locator = completed.result.unwrap();
    let artifact = f.output_store.resolve(&locator);
    assert!(artifact.is_file(), "missing artifact {artifact:?}");
    let content = std::fs::read_to_string(artifact).unwrap();
    assert!(content.contains("alpha"));
    assert!(content.contains("beta"));
}

#[tokio::test]
async fn test_deferred_job_failure_lands_on_ticket() {
    let f = fixture(SchedulerConfig::default());
    let (path, filesize) = write_upload(&f.upload_dir, "other\nvalue\n");

    // The job references a column the dataset does not have.
    let ticket = f.scheduler.submit(case_job(path, filesize)).unwrap();
    let completed = wait_for_completion(&f.ticket_store, &ticket.ticket).await;

    assert_eq!(completed.success, Some(false));
    assert!(completed.result.is_none());
    let comment = completed.comment.unwrap();
    assert!(comment.contains("name"), "{comment}");
}

#[tokio::test]
async fn test_unreadable_upload_fails_gracefully() {
    let f = fixture(SchedulerConfig::default());
    let missing = f.upload_dir.join("missing.csv");

    let ticket = f.scheduler.submit(case_job(missing, 0)).unwrap();
    let completed = wait_for_completion(&f.ticket_store, &ticket.ticket).await;

    assert_eq!(completed.success, Some(false));
    assert!(completed.comment.is_some());
}

#[tokio::test]
async fn test_submissions_create_distinct_tickets() {
    let f = fixture(SchedulerConfig::default());
    let (path, filesize) = write_upload(&f.upload_dir, "name\nAlpha\n");

    let first = f.scheduler.submit(case_job(path.clone(), filesize)).unwrap();
    let second = f.scheduler.submit(case_job(path, filesize)).unwrap();
    assert_ne!(first.ticket, second.ticket);

    let first = wait_for_completion(&f.ticket_store, &first.ticket).await;
    let second = wait_for_completion(&f.ticket_store, &second.ticket).await;

    // Each ticket carries its own single outcome, in its own directory.
    assert_ne!(first.result, second.result);
}

#[tokio::test]
async fn test_pool_survives_many_failures() {
    let f = fixture(SchedulerConfig {
        max_concurrent_jobs: 2,
        ticket_mode: TicketMode::All,
    });

    let mut tickets = Vec::new();
    for i in 0..5 {
        let path = f.upload_dir.join(format!("missing-{i}.csv"));
        tickets.push(f.scheduler.submit(case_job(path, 0)).unwrap());
    }
    // One good job at the end still runs to success.
    let (path, filesize) = write_upload(&f.upload_dir, "name\nOk\n");
    let good = f.scheduler.submit(case_job(path, filesize)).unwrap();

    for ticket in tickets {
        let completed = wait_for_completion(&f.ticket_store, &ticket.ticket).await;
        assert_eq!(completed.success, Some(false));
    }
    let completed = wait_for_completion(&f.ticket_store, &good.ticket).await;
    assert_eq!(completed.success, Some(true));
}

#[tokio::test]
async fn test_prompt_mode_records_ticket_when_configured() {
    let f = fixture(SchedulerConfig::default());
    let (path, filesize) = write_upload(&f.upload_dir, "name\nAlpha\n");

    let outcome = f.scheduler.run_prompt(case_job(path, filesize)).await.unwrap();
    assert!(outcome.artifact.is_file());

    let ticket = outcome.ticket.expect("ticket recorded in all mode");
    assert_eq!(ticket.status, TicketStatus::Completed);
    assert_eq!(ticket.success, Some(true));
    assert!(ticket.result.is_some());
}

#[tokio::test]
async fn test_prompt_mode_skips_ticket_when_deferred_only() {
    let f = fixture(SchedulerConfig {
        max_concurrent_jobs: 4,
        ticket_mode: TicketMode::DeferredOnly,
    });
    let (path, filesize) = write_upload(&f.upload_dir, "name\nAlpha\n");

    let outcome = f.scheduler.run_prompt(case_job(path, filesize)).await.unwrap();
    assert!(outcome.artifact.is_file());
    assert!(outcome.ticket.is_none());
}

#[tokio::test]
async fn test_prompt_failure_completes_ticket_and_errors() {
    let f = fixture(SchedulerConfig::default());
    let missing = f.upload_dir.join("missing.csv");

    let result = f.scheduler.run_prompt(case_job(missing, 0)).await;
    assert!(result.is_err());
}
