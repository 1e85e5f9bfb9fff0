//! Types for the job registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::Stage;

/// One acquisition-and-ingestion unit of work.
///
/// Owned exclusively by the registry; mutated only through `publish` by
/// the background task driving the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Opaque, effectively-unique identifier. Doubles as the filename
    /// prefix for every artifact the job produces.
    pub id: String,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
    pub last_stage: Stage,
    pub last_percent: u8,
    pub last_event_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: String, source_url: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            source_url,
            created_at: now,
            last_stage: Stage::Initializing,
            last_percent: 0,
            last_event_at: now,
        }
    }
}

/// Errors for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Job not found: {0}")]
    JobNotFound(String),
}
