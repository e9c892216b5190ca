//! Prometheus metrics for the job scheduler.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// Jobs submitted, by response mode ("prompt" / "deferred").
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scrub_jobs_submitted_total", "Total jobs submitted"),
        &["mode"],
    )
    .unwrap()
});

/// Jobs finished, by result ("success" / "failure").
pub static JOBS_COMPLETED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scrub_jobs_completed_total", "Total jobs finished"),
        &["result"],
    )
    .unwrap()
});

/// Wall-clock job duration in seconds, submission to completion.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("scrub_job_duration_seconds", "Job duration in seconds")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialize_and_count() {
        JOBS_SUBMITTED.with_label_values(&["deferred"]).inc();
        assert!(JOBS_SUBMITTED.with_label_values(&["deferred"]).get() >= 1);

        JOB_DURATION.with_label_values(&["success"]).observe(0.2);
    }
}
