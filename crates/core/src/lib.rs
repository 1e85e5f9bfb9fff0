//! Core library for pullcast, a background media acquisition pipeline.
//!
//! An external downloader process is spawned per job; its text output
//! is parsed into structured progress events, streamed to at most one
//! observer per job, and on success the resulting audio is registered
//! with the track library.

pub mod config;
pub mod downloader;
pub mod finalize;
pub mod library;
pub mod metrics;
pub mod progress;
pub mod registry;
pub mod testing;

pub use config::{load_config, validate_config, Config, ConfigError, SanitizedConfig};
pub use downloader::{DownloadError, Downloader};
pub use library::{LibraryError, LibraryStore, NewTrack, SqliteLibrary, Track};
pub use progress::{ProgressEvent, Stage};
pub use registry::{Job, JobRegistry, RegistryError};
