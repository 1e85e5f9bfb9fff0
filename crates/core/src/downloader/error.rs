//! Error types for the acquisition pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::library::LibraryError;

/// Errors that can occur while acquiring and ingesting media.
///
/// Everything past job creation collapses into a single terminal error
/// event on the job's timeline; only [`DownloadError::MissingUrl`] is
/// reported synchronously, before a job exists.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// No source URL supplied. Rejected before job creation.
    #[error("URL is required")]
    MissingUrl,

    /// Downloader binary could not be resolved.
    #[error("Downloader binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// The external process failed to spawn.
    #[error("Failed to launch downloader: {reason}")]
    Spawn { reason: String },

    /// The process exceeded the hard timeout and was force-killed.
    #[error("Download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The process exited non-zero.
    #[error("Download failed with exit code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    /// The process exited 0 but no prefix-matching audio file exists.
    #[error("Audio file not created")]
    AudioFileMissing,

    /// Sidecar or tag parsing failed. Recovered locally with fallback
    /// defaults; never terminal.
    #[error("Failed to read metadata: {reason}")]
    Metadata { reason: String },

    /// The library store rejected the record.
    #[error("Failed to register track: {0}")]
    Ingestion(#[from] LibraryError),

    /// I/O error in the pipeline.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Short reason label used in logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingUrl => "validation",
            Self::BinaryNotFound { .. } | Self::Spawn { .. } => "launch",
            Self::Timeout { .. } => "timeout",
            Self::ProcessFailed { .. } => "process",
            Self::AudioFileMissing => "artifact_missing",
            Self::Metadata { .. } => "metadata",
            Self::Ingestion(_) => "ingestion",
            Self::Io(_) => "io",
        }
    }
}
