//! Completion finalizer: artifact discovery, metadata extraction and
//! registration with the library store. Runs only after a 0 exit code.

mod artifacts;
mod metadata;

pub use artifacts::{discover_artifacts, Artifact};
pub use metadata::{resolve, TrackMetadata, DEFAULT_ALBUM, DEFAULT_ARTIST, DEFAULT_TITLE};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::downloader::DownloadError;
use crate::library::{LibraryStore, NewTrack, Track};

/// A fully resolved track ready for ingestion.
#[derive(Debug)]
pub struct PreparedTrack {
    pub track: NewTrack,
    /// Sidecar to delete after registration, best effort.
    info_path: Option<PathBuf>,
}

impl PreparedTrack {
    pub fn title(&self) -> &str {
        &self.track.title
    }
}

/// Registers completed downloads with the library store.
pub struct Finalizer {
    library: Arc<dyn LibraryStore>,
    genre: String,
}

impl Finalizer {
    pub fn new(library: Arc<dyn LibraryStore>, genre: impl Into<String>) -> Self {
        Self {
            library,
            genre: genre.into(),
        }
    }

    /// Locates the job's artifacts and resolves authoritative metadata.
    ///
    /// Fails with [`DownloadError::AudioFileMissing`] when the process
    /// claimed success but left no audio file behind.
    pub async fn prepare(
        &self,
        dir: &Path,
        job_id: &str,
        source_url: &str,
        folder_id: Option<String>,
    ) -> Result<PreparedTrack, DownloadError> {
        let artifact = discover_artifacts(dir, job_id).await?;
        let meta = metadata::resolve(artifact.info_path.as_deref(), &artifact.audio_path).await;

        let file_size_bytes = tokio::fs::metadata(&artifact.audio_path).await?.len();
        let file_name = artifact
            .audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{job_id}.bin"));
        let extension = artifact
            .audio_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp3");

        let track = NewTrack {
            title: meta.title.clone(),
            artist: meta.artist,
            album: meta.album,
            duration_secs: meta.duration_secs,
            genre: self.genre.clone(),
            year: meta.year,
            file_path: artifact.audio_path.clone(),
            file_name,
            original_name: format!("{}.{extension}", meta.title),
            file_size_bytes,
            mime_type: artifact.mime_type().to_string(),
            folder_id,
            thumbnail_path: artifact.thumbnail_path,
            source_url: Some(source_url.to_string()),
        };

        Ok(PreparedTrack {
            track,
            info_path: artifact.info_path,
        })
    }

    /// Registers the prepared track, then removes the metadata sidecar.
    ///
    /// A library rejection fails the job; files stay on disk for manual
    /// inspection. Sidecar deletion is best effort and never fails the
    /// job.
    pub async fn ingest(&self, prepared: PreparedTrack) -> Result<Track, DownloadError> {
        let stored = self.library.create_track(prepared.track).await?;
        info!(track_id = %stored.id, title = %stored.track.title, "Track registered with library");

        if let Some(info_path) = prepared.info_path {
            if let Err(e) = tokio::fs::remove_file(&info_path).await {
                warn!(path = %info_path.display(), "Failed to delete info sidecar: {e}");
            }
        }

        Ok(stored)
    }
}
