use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub library: LibraryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("pullcast.db")
}

/// External downloader configuration.
///
/// Timer fields default to the production values; they are configurable
/// so tests can shrink them without patching the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Explicit path to the downloader binary. When unset, an
    /// installation-local binary under `install_dir` is preferred, then
    /// one resolved from the ambient search path.
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Installation directory checked for a local downloader binary.
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// Destination directory for downloaded artifacts. Created if absent.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Output audio container/format.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Quality tier, 0 (best) - 10 (worst). The default trades size for
    /// speed on constrained hardware.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: u8,

    /// Retry count for both connection and fragment failures.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Hard per-job timeout; the process is force-killed past this.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Keepalive check interval.
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,

    /// Raw-output idle threshold past which a keepalive is synthesized.
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_secs: u64,

    /// Delay between a terminal event and connection teardown.
    #[serde(default = "default_grace")]
    pub grace_secs: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            install_dir: default_install_dir(),
            download_dir: default_download_dir(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            retries: default_retries(),
            timeout_secs: default_timeout(),
            keepalive_secs: default_keepalive(),
            idle_threshold_secs: default_idle_threshold(),
            grace_secs: default_grace(),
        }
    }
}

fn default_install_dir() -> PathBuf {
    PathBuf::from("bin")
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> u8 {
    5
}

fn default_retries() -> u32 {
    5
}

fn default_timeout() -> u64 {
    600
}

fn default_keepalive() -> u64 {
    30
}

fn default_idle_threshold() -> u64 {
    20
}

fn default_grace() -> u64 {
    2
}

/// Library ingestion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Genre stamped on every ingested track.
    #[serde(default = "default_genre")]
    pub default_genre: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            default_genre: default_genre(),
        }
    }
}

fn default_genre() -> String {
    "YouTube".to_string()
}

/// Sanitized config for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub downloader: DownloaderConfig,
    pub library: LibraryConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            downloader: config.downloader.clone(),
            library: config.library.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downloader_defaults_match_pipeline_contract() {
        let config = DownloaderConfig::default();
        assert_eq!(config.timeout_secs, 600);
        assert_eq!(config.keepalive_secs, 30);
        assert_eq!(config.idle_threshold_secs, 20);
        assert_eq!(config.grace_secs, 2);
        assert_eq!(config.retries, 5);
        assert_eq!(config.audio_format, "mp3");
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.downloader.timeout_secs, 600);
    }
}
