//! Library store - the persistence collaborator owning durable track
//! records. The pipeline only ever talks to the [`LibraryStore`] trait;
//! the bundled implementation is SQLite-backed.

mod sqlite;
mod types;

pub use sqlite::SqliteLibrary;
pub use types::{LibraryError, NewTrack, Track};

use async_trait::async_trait;

/// Trait for the durable track library.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Registers a track and returns the stored record with its
    /// generated id.
    async fn create_track(&self, track: NewTrack) -> Result<Track, LibraryError>;

    /// Fetches a track by id.
    async fn get_track(&self, id: &str) -> Result<Track, LibraryError>;

    /// Lists all tracks, newest first.
    async fn list_tracks(&self) -> Result<Vec<Track>, LibraryError>;
}
