//! In-memory library store for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::library::{LibraryError, LibraryStore, NewTrack, Track};

/// Mock library store recording every registered track.
#[derive(Default)]
pub struct MockLibrary {
    tracks: Mutex<Vec<Track>>,
    fail_next: AtomicBool,
}

impl MockLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `create_track` call fail, for the ingestion-error
    /// path.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// All tracks registered so far.
    pub fn created(&self) -> Vec<Track> {
        self.tracks.lock().unwrap().clone()
    }
}

#[async_trait]
impl LibraryStore for MockLibrary {
    async fn create_track(&self, track: NewTrack) -> Result<Track, LibraryError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(LibraryError::Database("mock rejection".to_string()));
        }
        let stored = Track {
            id: format!("track-{}", self.tracks.lock().unwrap().len() + 1),
            created_at: Utc::now(),
            track,
        };
        self.tracks.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn get_track(&self, id: &str) -> Result<Track, LibraryError> {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }

    async fn list_tracks(&self) -> Result<Vec<Track>, LibraryError> {
        Ok(self.created())
    }
}
