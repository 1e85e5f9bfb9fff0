//! In-flight job registry.
//!
//! Owns job identity and the currently attached observer per job. The
//! map is the only mutable state shared between connection handlers
//! (attach/detach) and the per-job background tasks (publish); jobs are
//! independent of one another and need no cross-job ordering.

mod types;

pub use types::{Job, RegistryError};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::progress::ProgressEvent;

struct JobEntry {
    job: Job,
    observer: Option<mpsc::Sender<ProgressEvent>>,
}

/// Thread-safe map of job id to job state and attached observer.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a job for the given source URL and returns its id.
    ///
    /// Ids combine a millisecond timestamp with a random suffix;
    /// collisions are not actively prevented, only made practically
    /// improbable.
    pub async fn create(&self, source_url: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let id = format!("dl-{}-{}", Utc::now().timestamp_millis(), &suffix[..8]);
        let job = Job::new(id.clone(), source_url.to_string());
        self.jobs.write().await.insert(
            id.clone(),
            JobEntry {
                job,
                observer: None,
            },
        );
        id
    }

    /// Attaches an observer to an existing job.
    ///
    /// A prior observer for the same id is superseded without
    /// notification; its channel is dropped and the old connection ends.
    pub async fn attach(
        &self,
        id: &str,
        observer: mpsc::Sender<ProgressEvent>,
    ) -> Result<(), RegistryError> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs
            .get_mut(id)
            .ok_or_else(|| RegistryError::JobNotFound(id.to_string()))?;
        if entry.observer.is_some() {
            debug!(job_id = id, "Superseding existing observer");
        }
        entry.observer = Some(observer);
        Ok(())
    }

    /// Detaches the observer, if any. The job continues regardless.
    pub async fn detach(&self, id: &str) {
        if let Some(entry) = self.jobs.write().await.get_mut(id) {
            entry.observer = None;
        }
    }

    /// Publishes an event to the attached observer, fire-and-forget.
    ///
    /// Never blocks and never fails the job path: with no observer (or a
    /// saturated channel) the event is silently dropped. Also records the
    /// event on the job itself so late observers have a last-known state.
    pub async fn publish(&self, id: &str, event: &ProgressEvent) {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(id) else {
            return;
        };
        entry.job.last_stage = event.stage;
        entry.job.last_percent = event.percent;
        entry.job.last_event_at = Utc::now();
        if let Some(observer) = &entry.observer {
            let _ = observer.try_send(event.clone());
        }
    }

    /// Snapshot of a job's current state.
    pub async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().await.get(id).map(|e| e.job.clone())
    }

    /// Removes the job entry, dropping any attached observer.
    pub async fn remove(&self, id: &str) {
        self.jobs.write().await.remove(id);
    }

    /// Number of in-flight jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
