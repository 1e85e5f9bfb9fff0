//! Background acquisition pipeline.
//!
//! `Downloader::start` validates the request, registers the job and
//! spawns a detached coordinator task, returning the job id
//! immediately. Everything else, launch to teardown, happens inside
//! that task.

mod error;
mod launcher;
mod runner;

pub use error::DownloadError;
pub use launcher::{Launcher, BINARY_NAME};

use std::sync::Arc;

use tracing::info;

use crate::config::{DownloaderConfig, LibraryConfig};
use crate::finalize::Finalizer;
use crate::library::LibraryStore;
use crate::metrics::JOBS_STARTED;
use crate::registry::JobRegistry;
use runner::JobRun;

/// Entry point for download jobs. Cheap to clone and share.
#[derive(Clone)]
pub struct Downloader {
    config: DownloaderConfig,
    launcher: Arc<Launcher>,
    finalizer: Arc<Finalizer>,
    registry: JobRegistry,
}

impl Downloader {
    pub fn new(
        config: DownloaderConfig,
        library_config: &LibraryConfig,
        registry: JobRegistry,
        library: Arc<dyn LibraryStore>,
    ) -> Self {
        let launcher = Arc::new(Launcher::new(config.clone()));
        let finalizer = Arc::new(Finalizer::new(library, library_config.default_genre.clone()));
        Self {
            config,
            launcher,
            finalizer,
            registry,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Starts a new download job and returns its id.
    ///
    /// Validation is the only synchronous failure; once the id is
    /// handed out, all further failures are reported through the job's
    /// progress events.
    pub async fn start(
        &self,
        url: &str,
        folder_id: Option<String>,
    ) -> Result<String, DownloadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::MissingUrl);
        }

        let job_id = self.registry.create(url).await;
        info!(job_id = %job_id, url = %url, "Download job started");
        JOBS_STARTED.inc();

        let run = JobRun {
            launcher: self.launcher.clone(),
            finalizer: self.finalizer.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
            job_id: job_id.clone(),
            url: url.to_string(),
            folder_id,
        };
        tokio::spawn(run.run());

        Ok(job_id)
    }
}
