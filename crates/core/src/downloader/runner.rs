//! Per-job coordinator task.
//!
//! One task per job merges external-process output and timer-fired
//! events onto a single channel it alone consumes; there is no shared
//! mutable state beyond the registry. The watchdog timers (hard timeout
//! and keepalive) live inside the coordinator's select loop, so they
//! stop the instant the process exits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::error::DownloadError;
use super::launcher::Launcher;
use crate::config::DownloaderConfig;
use crate::finalize::Finalizer;
use crate::metrics::{JOBS_ACTIVE, JOBS_COMPLETED, JOBS_FAILED, JOB_DURATION, KEEPALIVES_SENT};
use crate::progress::{LineBuffer, OutputClassifier, ProgressEvent, Stage};
use crate::registry::JobRegistry;

/// Cap on retained stderr output for error reporting.
const STDERR_TAIL_BYTES: usize = 4096;

/// One completed line from either output stream.
enum JobOutput {
    Stdout(String),
    Stderr(String),
}

/// Everything a coordinator task needs to drive one job.
pub(super) struct JobRun {
    pub launcher: Arc<Launcher>,
    pub finalizer: Arc<Finalizer>,
    pub registry: JobRegistry,
    pub config: DownloaderConfig,
    pub job_id: String,
    pub url: String,
    pub folder_id: Option<String>,
}

impl JobRun {
    /// Drives the job to a terminal event, then tears the entry down
    /// after the grace window. Never returns an error: every internal
    /// failure collapses into the terminal error event.
    pub async fn run(self) {
        let started = Instant::now();
        JOBS_ACTIVE.inc();

        self.registry
            .publish(
                &self.job_id,
                &ProgressEvent::stage(Stage::Initializing, "Starting download...", 0),
            )
            .await;

        let outcome = self.drive().await;

        match outcome {
            Ok(title) => {
                info!(job_id = %self.job_id, title = %title, "Download complete");
                JOBS_COMPLETED.inc();
                JOB_DURATION
                    .with_label_values(&["complete"])
                    .observe(started.elapsed().as_secs_f64());
            }
            Err(e) => {
                warn!(job_id = %self.job_id, reason = e.reason(), "Download failed: {e}");
                JOBS_FAILED.with_label_values(&[e.reason()]).inc();
                JOB_DURATION
                    .with_label_values(&["error"])
                    .observe(started.elapsed().as_secs_f64());
                self.registry.publish(&self.job_id, &error_event(&e)).await;
            }
        }

        // The grace window guarantees the client receives the terminal
        // event before the connection is torn down.
        tokio::time::sleep(Duration::from_secs(self.config.grace_secs)).await;
        self.registry.detach(&self.job_id).await;
        self.registry.remove(&self.job_id).await;
        JOBS_ACTIVE.dec();
    }

    /// Launch, monitor and finalize. Returns the resolved title.
    async fn drive(&self) -> Result<String, DownloadError> {
        let mut child = self.launcher.spawn(&self.job_id, &self.url).await?;
        let output_rx = spawn_output_pumps(&mut child)?;

        self.monitor(&mut child, output_rx).await?;

        self.registry
            .publish(
                &self.job_id,
                &ProgressEvent::stage(Stage::Finalizing, "Processing download...", 80),
            )
            .await;

        let prepared = self
            .finalizer
            .prepare(
                &self.config.download_dir,
                &self.job_id,
                &self.url,
                self.folder_id.clone(),
            )
            .await?;
        let title = prepared.title().to_string();

        self.registry
            .publish(
                &self.job_id,
                &ProgressEvent::stage(Stage::Saving, "Saving to library...", 90)
                    .with_title(title.clone()),
            )
            .await;

        self.finalizer.ingest(prepared).await?;

        self.registry
            .publish(
                &self.job_id,
                &ProgressEvent::stage(Stage::Complete, "Download complete", 100)
                    .with_title(title.clone()),
            )
            .await;

        Ok(title)
    }

    /// The coordinator loop: consumes merged output lines, fires the
    /// keepalive, enforces the hard timeout, and waits for exit.
    async fn monitor(
        &self,
        child: &mut Child,
        mut output_rx: mpsc::Receiver<JobOutput>,
    ) -> Result<(), DownloadError> {
        let mut classifier = OutputClassifier::new();
        let mut stderr_tail = String::new();
        let mut last_event = ProgressEvent::stage(Stage::Initializing, "Starting download...", 0);
        let mut last_output = Instant::now();

        let keepalive_period = Duration::from_secs(self.config.keepalive_secs);
        let idle_threshold = Duration::from_secs(self.config.idle_threshold_secs);
        // Measured from the most recent output line, not from launch;
        // every line re-anchors the interval.
        let mut keepalive =
            tokio::time::interval_at(tokio::time::Instant::now() + keepalive_period, keepalive_period);

        let hard_timeout = tokio::time::sleep(Duration::from_secs(self.config.timeout_secs));
        tokio::pin!(hard_timeout);

        loop {
            tokio::select! {
                output = output_rx.recv() => match output {
                    Some(JobOutput::Stdout(line)) => {
                        last_output = Instant::now();
                        keepalive.reset();
                        debug!(job_id = %self.job_id, line = %line, "downloader output");
                        if let Some(event) = classifier.classify(&line) {
                            last_event = event.clone();
                            self.registry.publish(&self.job_id, &event).await;
                        }
                    }
                    Some(JobOutput::Stderr(line)) => {
                        last_output = Instant::now();
                        keepalive.reset();
                        if stderr_tail.len() < STDERR_TAIL_BYTES {
                            stderr_tail.push_str(&line);
                            stderr_tail.push('\n');
                        }
                    }
                    None => {
                        // Both streams closed. The process usually
                        // exits right after, but closed pipes do not
                        // prove exit; the hard timeout still applies
                        // while waiting for it.
                        let status = tokio::select! {
                            status = child.wait() => status?,
                            _ = &mut hard_timeout => {
                                warn!(job_id = %self.job_id, "Hard timeout reached, killing process");
                                let _ = child.start_kill();
                                let _ = child.wait().await;
                                return Err(DownloadError::Timeout {
                                    timeout_secs: self.config.timeout_secs,
                                });
                            }
                        };
                        if status.success() {
                            return Ok(());
                        }
                        let code = status.code().unwrap_or(-1);
                        return Err(DownloadError::ProcessFailed {
                            code,
                            stderr: stderr_tail.trim_end().to_string(),
                        });
                    }
                },
                _ = keepalive.tick() => {
                    // Defeats idle-connection timeouts imposed by
                    // intermediaries while the tool is quiet.
                    if last_output.elapsed() > idle_threshold {
                        KEEPALIVES_SENT.inc();
                        self.registry.publish(&self.job_id, &last_event).await;
                    }
                }
                _ = &mut hard_timeout => {
                    warn!(job_id = %self.job_id, "Hard timeout reached, killing process");
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return Err(DownloadError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    });
                }
            }
        }
    }
}

/// Spawns the two stream-pump tasks, merging both output streams onto
/// one channel. The streams are read concurrently and never block one
/// another.
fn spawn_output_pumps(child: &mut Child) -> Result<mpsc::Receiver<JobOutput>, DownloadError> {
    let stdout = child.stdout.take().ok_or_else(|| DownloadError::Spawn {
        reason: "stdout not captured".to_string(),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| DownloadError::Spawn {
        reason: "stderr not captured".to_string(),
    })?;

    let (tx, rx) = mpsc::channel(256);

    tokio::spawn(pump_stream(stdout, JobOutput::Stdout, tx.clone()));
    tokio::spawn(pump_stream(stderr, JobOutput::Stderr, tx));

    Ok(rx)
}

/// Reads one stream chunk-wise, splitting on line boundaries.
async fn pump_stream<R, F>(mut reader: R, wrap: F, tx: mpsc::Sender<JobOutput>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    F: Fn(String) -> JobOutput + Send + 'static,
{
    let mut buffer = LineBuffer::new();
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                for line in buffer.push(&chunk[..n]) {
                    if tx.send(wrap(line)).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
    if let Some(line) = buffer.finish() {
        let _ = tx.send(wrap(line)).await;
    }
}

/// Maps a pipeline failure to its single terminal event.
fn error_event(error: &DownloadError) -> ProgressEvent {
    match error {
        DownloadError::Timeout { timeout_secs } => ProgressEvent::error(
            format!("Download timed out after {timeout_secs} seconds"),
            "timeout",
        ),
        DownloadError::ProcessFailed { code, stderr } => {
            if stderr.is_empty() {
                ProgressEvent::error(
                    format!("Download failed with exit code {code}"),
                    format!("exit code {code}"),
                )
            } else {
                ProgressEvent::error(
                    format!("Download failed with exit code {code}: {stderr}"),
                    stderr.clone(),
                )
            }
        }
        DownloadError::AudioFileMissing => {
            ProgressEvent::error("Audio file not created", "artifact missing")
        }
        other => ProgressEvent::error("Download failed", other.to_string()),
    }
}
