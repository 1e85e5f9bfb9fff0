//! SQLite-backed library store implementation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::{LibraryError, LibraryStore, NewTrack, Track};

/// SQLite-backed library store.
pub struct SqliteLibrary {
    conn: Mutex<Connection>,
}

impl SqliteLibrary {
    /// Opens (or creates) the library database at the given path.
    pub fn new(path: &Path) -> Result<Self, LibraryError> {
        let conn = Connection::open(path).map_err(|e| LibraryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory library (useful for testing).
    pub fn in_memory() -> Result<Self, LibraryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| LibraryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LibraryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tracks (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                title TEXT NOT NULL,
                artist TEXT NOT NULL,
                album TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                genre TEXT NOT NULL,
                year INTEGER,
                file_path TEXT NOT NULL,
                file_name TEXT NOT NULL,
                original_name TEXT NOT NULL,
                file_size_bytes INTEGER NOT NULL,
                mime_type TEXT NOT NULL,
                folder_id TEXT,
                thumbnail_path TEXT,
                source_url TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tracks_created ON tracks(created_at);
            CREATE INDEX IF NOT EXISTS idx_tracks_album ON tracks(album);
            "#,
        )
        .map_err(|e| LibraryError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_track(row: &Row<'_>) -> rusqlite::Result<Track> {
        let created_at: String = row.get("created_at")?;
        let file_path: String = row.get("file_path")?;
        let thumbnail_path: Option<String> = row.get("thumbnail_path")?;
        Ok(Track {
            id: row.get("id")?,
            created_at: created_at
                .parse::<DateTime<Utc>>()
                .unwrap_or_else(|_| Utc::now()),
            track: NewTrack {
                title: row.get("title")?,
                artist: row.get("artist")?,
                album: row.get("album")?,
                duration_secs: row.get("duration_secs")?,
                genre: row.get("genre")?,
                year: row.get("year")?,
                file_path: PathBuf::from(file_path),
                file_name: row.get("file_name")?,
                original_name: row.get("original_name")?,
                file_size_bytes: row.get("file_size_bytes")?,
                mime_type: row.get("mime_type")?,
                folder_id: row.get("folder_id")?,
                thumbnail_path: thumbnail_path.map(PathBuf::from),
                source_url: row.get("source_url")?,
            },
        })
    }
}

#[async_trait]
impl LibraryStore for SqliteLibrary {
    async fn create_track(&self, track: NewTrack) -> Result<Track, LibraryError> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let conn = self
            .conn
            .lock()
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO tracks (
                id, created_at, title, artist, album, duration_secs, genre,
                year, file_path, file_name, original_name, file_size_bytes,
                mime_type, folder_id, thumbnail_path, source_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                id,
                created_at.to_rfc3339(),
                track.title,
                track.artist,
                track.album,
                track.duration_secs,
                track.genre,
                track.year,
                track.file_path.to_string_lossy(),
                track.file_name,
                track.original_name,
                track.file_size_bytes,
                track.mime_type,
                track.folder_id,
                track
                    .thumbnail_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
                track.source_url,
            ],
        )
        .map_err(|e| LibraryError::Database(e.to_string()))?;

        Ok(Track {
            id,
            created_at,
            track,
        })
    }

    async fn get_track(&self, id: &str) -> Result<Track, LibraryError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        conn.query_row("SELECT * FROM tracks WHERE id = ?1", params![id], |row| {
            Self::row_to_track(row)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => LibraryError::NotFound(id.to_string()),
            other => LibraryError::Database(other.to_string()),
        })
    }

    async fn list_tracks(&self) -> Result<Vec<Track>, LibraryError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare("SELECT * FROM tracks ORDER BY created_at DESC")
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Self::row_to_track(row))
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| LibraryError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_track() -> NewTrack {
        NewTrack {
            title: "Example Song".to_string(),
            artist: "Example Artist".to_string(),
            album: "YouTube Downloads".to_string(),
            duration_secs: 180,
            genre: "YouTube".to_string(),
            year: Some(2024),
            file_path: PathBuf::from("/music/dl-1.mp3"),
            file_name: "dl-1.mp3".to_string(),
            original_name: "Example Song.mp3".to_string(),
            file_size_bytes: 4_200_000,
            mime_type: "audio/mpeg".to_string(),
            folder_id: None,
            thumbnail_path: Some(PathBuf::from("/music/dl-1.jpg")),
            source_url: Some("https://youtube.com/watch?v=abc".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_track() {
        let library = SqliteLibrary::in_memory().unwrap();
        let created = library.create_track(sample_track()).await.unwrap();
        assert!(!created.id.is_empty());

        let fetched = library.get_track(&created.id).await.unwrap();
        assert_eq!(fetched.track.title, "Example Song");
        assert_eq!(fetched.track.duration_secs, 180);
        assert_eq!(fetched.track.mime_type, "audio/mpeg");
        assert_eq!(
            fetched.track.source_url.as_deref(),
            Some("https://youtube.com/watch?v=abc")
        );
    }

    #[tokio::test]
    async fn test_get_missing_track() {
        let library = SqliteLibrary::in_memory().unwrap();
        let result = library.get_track("nope").await;
        assert!(matches!(result, Err(LibraryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_tracks() {
        let library = SqliteLibrary::in_memory().unwrap();
        library.create_track(sample_track()).await.unwrap();
        let mut second = sample_track();
        second.title = "Another Song".to_string();
        library.create_track(second).await.unwrap();

        let tracks = library.list_tracks().await.unwrap();
        assert_eq!(tracks.len(), 2);
    }
}
