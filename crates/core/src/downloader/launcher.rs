//! Spawning of the external downloader process.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use super::error::DownloadError;
use crate::config::DownloaderConfig;

/// Default binary name, resolved from the ambient search path when no
/// installation-local copy exists.
pub const BINARY_NAME: &str = "yt-dlp";

/// Builds the fixed argument set and spawns the downloader.
pub struct Launcher {
    binary: PathBuf,
    config: DownloaderConfig,
}

impl Launcher {
    /// Creates a launcher, resolving the binary path once.
    pub fn new(config: DownloaderConfig) -> Self {
        let binary = Self::resolve_binary(&config);
        debug!(binary = %binary.display(), "Resolved downloader binary");
        Self { binary, config }
    }

    /// Resolution order: explicit configured path, installation-local
    /// binary, bare name left to the ambient search path.
    fn resolve_binary(config: &DownloaderConfig) -> PathBuf {
        if let Some(path) = &config.binary_path {
            return path.clone();
        }
        let local = config.install_dir.join(BINARY_NAME);
        if local.is_file() {
            return local;
        }
        PathBuf::from(BINARY_NAME)
    }

    /// The resolved binary path.
    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    /// The fixed argument set for one job.
    ///
    /// Audio-only extraction at a fixed quality tier, thumbnail and
    /// info-json sidecars, single-item mode, line-buffered progress, a
    /// title announcement before download starts, fixed retry counts
    /// with unavailable-fragment skipping, forced IPv4, and an output
    /// template carrying the job's unique prefix.
    pub fn build_args(&self, job_id: &str, url: &str) -> Vec<String> {
        let output_template = self
            .config
            .download_dir
            .join(format!("{job_id}.%(ext)s"))
            .to_string_lossy()
            .to_string();

        vec![
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--audio-quality".to_string(),
            self.config.audio_quality.to_string(),
            "--write-thumbnail".to_string(),
            "--write-info-json".to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "before_dl:Found: %(title)s".to_string(),
            "--retries".to_string(),
            self.config.retries.to_string(),
            "--fragment-retries".to_string(),
            self.config.retries.to_string(),
            "--skip-unavailable-fragments".to_string(),
            "--force-ipv4".to_string(),
            "--output".to_string(),
            output_template,
            url.to_string(),
        ]
    }

    /// Spawns the process with both output streams captured.
    ///
    /// Creates the destination directory if absent. A spawn failure is
    /// reported the same way as a process error further down the line.
    pub async fn spawn(&self, job_id: &str, url: &str) -> Result<Child, DownloadError> {
        tokio::fs::create_dir_all(&self.config.download_dir).await?;

        let args = self.build_args(job_id, url);
        debug!(job_id, binary = %self.binary.display(), "Spawning downloader");

        Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DownloadError::BinaryNotFound {
                        path: self.binary.clone(),
                    }
                } else {
                    DownloadError::Spawn {
                        reason: e.to_string(),
                    }
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> DownloaderConfig {
        DownloaderConfig {
            download_dir: PathBuf::from("/srv/music"),
            ..DownloaderConfig::default()
        }
    }

    #[test]
    fn test_build_args_fixed_set() {
        let launcher = Launcher::new(test_config());
        let args = launcher.build_args("dl-123-abcd", "https://youtube.com/watch?v=x");

        assert!(args.contains(&"--extract-audio".to_string()));
        assert!(args.contains(&"--audio-format".to_string()));
        assert!(args.contains(&"mp3".to_string()));
        assert!(args.contains(&"--write-thumbnail".to_string()));
        assert!(args.contains(&"--write-info-json".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--newline".to_string()));
        assert!(args.contains(&"--force-ipv4".to_string()));
        assert!(args.contains(&"--skip-unavailable-fragments".to_string()));
        // Retry count applies to both connections and fragments.
        let retries: Vec<_> = args.iter().filter(|a| *a == "5").collect();
        assert_eq!(retries.len(), 2);
        // Output template carries the job's unique prefix.
        assert!(args.contains(&"/srv/music/dl-123-abcd.%(ext)s".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtube.com/watch?v=x");
    }

    #[test]
    fn test_explicit_binary_path_wins() {
        let config = DownloaderConfig {
            binary_path: Some(PathBuf::from("/opt/yt-dlp")),
            ..test_config()
        };
        let launcher = Launcher::new(config);
        assert_eq!(launcher.binary(), &PathBuf::from("/opt/yt-dlp"));
    }

    #[test]
    fn test_falls_back_to_search_path() {
        let config = DownloaderConfig {
            install_dir: PathBuf::from("/nonexistent-install-dir"),
            ..test_config()
        };
        let launcher = Launcher::new(config);
        assert_eq!(launcher.binary(), &PathBuf::from("yt-dlp"));
    }

    #[test]
    fn test_prefers_install_local_binary() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("yt-dlp");
        std::fs::write(&local, "#!/bin/sh\n").unwrap();

        let config = DownloaderConfig {
            install_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        let launcher = Launcher::new(config);
        assert_eq!(launcher.binary(), &local);
    }
}
