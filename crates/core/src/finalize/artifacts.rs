//! Artifact discovery after the external process exits.

use std::path::{Path, PathBuf};

use crate::downloader::DownloadError;

/// Audio extensions the downloader can produce.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "opus", "ogg", "flac", "wav"];
/// Thumbnail extensions the downloader can produce.
const THUMBNAIL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
/// Suffix of the structured-metadata sidecar.
const INFO_SUFFIX: &str = ".info.json";

/// Files produced by the external process for one job, discovered by
/// filename-prefix matching in the destination directory.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub audio_path: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
    pub info_path: Option<PathBuf>,
}

impl Artifact {
    /// Mime type derived from the audio file extension.
    pub fn mime_type(&self) -> &'static str {
        match self
            .audio_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
        {
            "mp3" => "audio/mpeg",
            "m4a" => "audio/mp4",
            "opus" => "audio/opus",
            "ogg" => "audio/ogg",
            "flac" => "audio/flac",
            "wav" => "audio/wav",
            _ => "application/octet-stream",
        }
    }
}

/// Lists the destination directory and buckets prefix-matching files.
///
/// A 0 exit code does not guarantee an audio file exists on disk; that
/// divergence is checked here explicitly and surfaces as
/// [`DownloadError::AudioFileMissing`].
pub async fn discover_artifacts(dir: &Path, prefix: &str) -> Result<Artifact, DownloadError> {
    let mut audio = None;
    let mut thumbnail = None;
    let mut info = None;

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        let path = entry.path();

        if name.ends_with(INFO_SUFFIX) {
            info = Some(path);
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            audio = Some(path);
        } else if THUMBNAIL_EXTENSIONS.contains(&ext.as_str()) {
            thumbnail = Some(path);
        }
    }

    let audio_path = audio.ok_or(DownloadError::AudioFileMissing)?;
    Ok(Artifact {
        audio_path,
        thumbnail_path: thumbnail,
        info_path: info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn touch(dir: &Path, name: &str) {
        tokio::fs::write(dir.join(name), b"x").await.unwrap();
    }

    #[tokio::test]
    async fn test_discovers_all_buckets() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dl-1.mp3").await;
        touch(dir.path(), "dl-1.webp").await;
        touch(dir.path(), "dl-1.info.json").await;
        touch(dir.path(), "dl-2.mp3").await;

        let artifact = discover_artifacts(dir.path(), "dl-1").await.unwrap();
        assert!(artifact.audio_path.ends_with("dl-1.mp3"));
        assert!(artifact.thumbnail_path.unwrap().ends_with("dl-1.webp"));
        assert!(artifact.info_path.unwrap().ends_with("dl-1.info.json"));
    }

    #[tokio::test]
    async fn test_missing_audio_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dl-1.info.json").await;
        touch(dir.path(), "dl-1.jpg").await;

        let result = discover_artifacts(dir.path(), "dl-1").await;
        assert!(matches!(result, Err(DownloadError::AudioFileMissing)));
    }

    #[tokio::test]
    async fn test_audio_only_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dl-1.m4a").await;

        let artifact = discover_artifacts(dir.path(), "dl-1").await.unwrap();
        assert!(artifact.thumbnail_path.is_none());
        assert!(artifact.info_path.is_none());
        assert_eq!(artifact.mime_type(), "audio/mp4");
    }

    #[test]
    fn test_mime_types() {
        let artifact = Artifact {
            audio_path: PathBuf::from("x.mp3"),
            thumbnail_path: None,
            info_path: None,
        };
        assert_eq!(artifact.mime_type(), "audio/mpeg");
    }
}
