//! Authoritative metadata extraction for completed downloads.
//!
//! Resolution order: the `.info.json` sidecar, then tags embedded in the
//! audio file (read via ffprobe), then fixed defaults. Each source only
//! fills fields the more authoritative ones left empty, and any parse
//! failure is recovered locally - metadata problems never fail a job.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::downloader::DownloadError;

/// Fallback title when no source provides one.
pub const DEFAULT_TITLE: &str = "Downloaded Video";
/// Fallback artist.
pub const DEFAULT_ARTIST: &str = "YouTube";
/// Fallback album.
pub const DEFAULT_ALBUM: &str = "YouTube Downloads";

/// Resolved track metadata, every field populated.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Rounded to the nearest second.
    pub duration_secs: u32,
    pub year: Option<u16>,
}

/// Partial metadata extracted from a single source.
#[derive(Debug, Clone, Default)]
pub struct PartialMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_secs: Option<u32>,
    pub year: Option<u16>,
}

impl PartialMetadata {
    /// Fills empty fields from a less authoritative source.
    fn or(mut self, fallback: PartialMetadata) -> Self {
        self.title = self.title.or(fallback.title);
        self.artist = self.artist.or(fallback.artist);
        self.album = self.album.or(fallback.album);
        self.duration_secs = self.duration_secs.or(fallback.duration_secs);
        self.year = self.year.or(fallback.year);
        self
    }

    fn finish(self) -> TrackMetadata {
        TrackMetadata {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            artist: self.artist.unwrap_or_else(|| DEFAULT_ARTIST.to_string()),
            album: self.album.unwrap_or_else(|| DEFAULT_ALBUM.to_string()),
            duration_secs: self.duration_secs.unwrap_or(0),
            year: self.year,
        }
    }
}

/// Shape of the downloader's `.info.json` sidecar, reduced to the fields
/// the library cares about.
#[derive(Debug, Deserialize)]
struct InfoSidecar {
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    album: Option<String>,
    playlist: Option<String>,
    duration: Option<f64>,
    /// YYYYMMDD
    upload_date: Option<String>,
}

/// Parses the info-metadata sidecar.
pub async fn from_info_json(path: &Path) -> Result<PartialMetadata, DownloadError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let info: InfoSidecar =
        serde_json::from_str(&raw).map_err(|e| DownloadError::Metadata {
            reason: format!("Failed to parse info sidecar: {e}"),
        })?;

    Ok(PartialMetadata {
        title: info.title,
        artist: info.uploader.or(info.channel),
        album: info.album.or(info.playlist),
        duration_secs: info.duration.map(|d| d.round().max(0.0) as u32),
        year: info
            .upload_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok()),
    })
}

/// Reads tags embedded in the audio file via ffprobe.
pub async fn from_audio_tags(path: &Path) -> Result<PartialMetadata, DownloadError> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| DownloadError::Metadata {
            reason: format!("ffprobe failed to run: {e}"),
        })?;

    if !output.status.success() {
        return Err(DownloadError::Metadata {
            reason: format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_output(output: &str) -> Result<PartialMetadata, DownloadError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        format: ProbeFormat,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
        tags: Option<ProbeTags>,
    }

    #[derive(Deserialize)]
    struct ProbeTags {
        title: Option<String>,
        artist: Option<String>,
        album: Option<String>,
        date: Option<String>,
    }

    let probe: ProbeOutput =
        serde_json::from_str(output).map_err(|e| DownloadError::Metadata {
            reason: format!("Failed to parse ffprobe output: {e}"),
        })?;

    let tags = probe.format.tags.unwrap_or(ProbeTags {
        title: None,
        artist: None,
        album: None,
        date: None,
    });

    Ok(PartialMetadata {
        title: tags.title,
        artist: tags.artist,
        album: tags.album,
        duration_secs: probe
            .format
            .duration
            .and_then(|d| d.parse::<f64>().ok())
            .map(|d| d.round().max(0.0) as u32),
        year: tags.date.as_deref().and_then(|d| d.get(..4)).and_then(|y| y.parse().ok()),
    })
}

/// Resolves metadata for a finished download.
///
/// Sidecar and tag failures are logged and recovered; the result always
/// has every field populated, with the fixed defaults as the floor.
pub async fn resolve(info_path: Option<&Path>, audio_path: &Path) -> TrackMetadata {
    let from_sidecar = match info_path {
        Some(path) => match from_info_json(path).await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(path = %path.display(), "Info sidecar unreadable: {e}");
                PartialMetadata::default()
            }
        },
        None => PartialMetadata::default(),
    };

    // The embedded tags are only consulted for fields the sidecar
    // missed; a complete sidecar skips the probe entirely.
    let needs_tags = from_sidecar.title.is_none()
        || from_sidecar.artist.is_none()
        || from_sidecar.duration_secs.is_none();
    let from_tags = if needs_tags {
        match from_audio_tags(audio_path).await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(path = %audio_path.display(), "Audio tags unreadable: {e}");
                PartialMetadata::default()
            }
        }
    } else {
        PartialMetadata::default()
    };

    from_sidecar.or(from_tags).finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_info_json_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dl-1.info.json");
        tokio::fs::write(
            &path,
            r#"{"title":"Example Song","uploader":"Example Artist","duration":180.4,"upload_date":"20240115"}"#,
        )
        .await
        .unwrap();

        let meta = from_info_json(&path).await.unwrap();
        assert_eq!(meta.title.as_deref(), Some("Example Song"));
        assert_eq!(meta.artist.as_deref(), Some("Example Artist"));
        assert_eq!(meta.duration_secs, Some(180));
        assert_eq!(meta.year, Some(2024));
        assert!(meta.album.is_none());
    }

    #[tokio::test]
    async fn test_info_json_channel_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dl-1.info.json");
        tokio::fs::write(&path, r#"{"title":"T","channel":"Some Channel"}"#)
            .await
            .unwrap();

        let meta = from_info_json(&path).await.unwrap();
        assert_eq!(meta.artist.as_deref(), Some("Some Channel"));
    }

    #[tokio::test]
    async fn test_info_json_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dl-1.info.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let result = from_info_json(&path).await;
        assert!(matches!(result, Err(DownloadError::Metadata { .. })));
    }

    #[test]
    fn test_probe_output_tags() {
        let json = r#"{
            "format": {
                "duration": "179.6",
                "tags": {"title": "Tagged Title", "artist": "Tagged Artist", "date": "2023"}
            }
        }"#;
        let meta = parse_probe_output(json).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Tagged Title"));
        assert_eq!(meta.duration_secs, Some(180));
        assert_eq!(meta.year, Some(2023));
    }

    #[test]
    fn test_duration_rounds_to_nearest_second() {
        let json = r#"{"format": {"duration": "179.4"}}"#;
        let meta = parse_probe_output(json).unwrap();
        assert_eq!(meta.duration_secs, Some(179));
    }

    #[test]
    fn test_merge_prefers_authoritative_source() {
        let sidecar = PartialMetadata {
            title: Some("Sidecar Title".to_string()),
            ..PartialMetadata::default()
        };
        let tags = PartialMetadata {
            title: Some("Tag Title".to_string()),
            artist: Some("Tag Artist".to_string()),
            ..PartialMetadata::default()
        };

        let resolved = sidecar.or(tags).finish();
        assert_eq!(resolved.title, "Sidecar Title");
        assert_eq!(resolved.artist, "Tag Artist");
        assert_eq!(resolved.album, DEFAULT_ALBUM);
    }

    #[test]
    fn test_defaults_are_the_floor() {
        let resolved = PartialMetadata::default().finish();
        assert_eq!(resolved.title, "Downloaded Video");
        assert_eq!(resolved.artist, "YouTube");
        assert_eq!(resolved.album, "YouTube Downloads");
        assert_eq!(resolved.duration_secs, 0);
        assert_eq!(resolved.year, None);
    }
}
