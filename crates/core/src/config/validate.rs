use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Download directory is set
/// - Watchdog timers are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.downloader.download_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloader.download_dir cannot be empty".to_string(),
        ));
    }

    if config.downloader.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.downloader.keepalive_secs == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.keepalive_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ServerConfig};
    use std::net::IpAddr;
    use std::path::PathBuf;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Config::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_download_dir_fails() {
        let mut config = Config::default();
        config.downloader.download_dir = PathBuf::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.downloader.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
