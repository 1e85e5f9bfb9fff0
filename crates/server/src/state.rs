use std::sync::Arc;

use pullcast_core::{Config, Downloader, JobRegistry, LibraryStore, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    downloader: Downloader,
    library: Arc<dyn LibraryStore>,
}

impl AppState {
    pub fn new(config: Config, downloader: Downloader, library: Arc<dyn LibraryStore>) -> Self {
        Self {
            config,
            downloader,
            library,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    pub fn registry(&self) -> &JobRegistry {
        self.downloader.registry()
    }

    pub fn library(&self) -> &dyn LibraryStore {
        self.library.as_ref()
    }
}
