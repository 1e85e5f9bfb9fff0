//! Prometheus metrics for the acquisition pipeline.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

/// Jobs created.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("pullcast_jobs_started_total", "Total download jobs started").unwrap()
});

/// Jobs that reached the complete stage.
pub static JOBS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "pullcast_jobs_completed_total",
        "Total download jobs completed successfully",
    )
    .unwrap()
});

/// Jobs that ended in a terminal error, by reason.
pub static JOBS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pullcast_jobs_failed_total", "Total download jobs failed"),
        &["reason"], // "launch", "timeout", "process", "artifact_missing", "ingestion"
    )
    .unwrap()
});

/// Jobs currently in flight.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("pullcast_jobs_active", "Download jobs currently in flight").unwrap()
});

/// End-to-end job duration in seconds, by outcome.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pullcast_job_duration_seconds",
            "Duration of download jobs from launch to terminal event",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["outcome"], // "complete", "error"
    )
    .unwrap()
});

/// Keepalive events synthesized for idle jobs.
pub static KEEPALIVES_SENT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "pullcast_keepalives_sent_total",
        "Synthetic keepalive events sent to idle observers",
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_FAILED.clone()),
        Box::new(JOBS_ACTIVE.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(KEEPALIVES_SENT.clone()),
    ]
}
