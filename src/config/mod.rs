use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub origin: OriginConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long in-flight requests may run after a shutdown signal
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: String,
    /// Upper bound for request bodies forwarded to the origin
    #[serde(default = "default_max_request_body")]
    pub max_request_body: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one JPEG file per cache entry
    #[serde(default = "default_cache_path")]
    pub path: String,
    /// Maximum number of cached previews
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Largest width or height a client may request
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout: default_shutdown_timeout(),
            max_request_body: default_max_request_body(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            capacity: default_cache_capacity(),
        }
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            max_dimension: default_max_dimension(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl WebConfig {
    pub fn shutdown_timeout(&self) -> Result<Duration> {
        parse_duration("web.shutdown_timeout", &self.shutdown_timeout)
    }
}

impl CacheConfig {
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    pub fn capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.capacity).context("cache.capacity must be at least 1")
    }
}

impl OriginConfig {
    pub fn connect_timeout(&self) -> Result<Duration> {
        parse_duration("origin.connect_timeout", &self.connect_timeout)
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        parse_duration("origin.request_timeout", &self.request_timeout)
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value)
        .with_context(|| format!("Invalid duration for {field}: '{value}'"))
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from an existing file
    File,
    /// The file was missing and has been written with defaults
    CreatedDefault,
}

impl Config {
    /// Load `config_file`, writing a default one first if it does not exist
    ///
    /// Runs before logging is set up, so the caller reports the source.
    pub fn load_from_file(config_file: &str) -> Result<(Self, ConfigSource)> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)
                .with_context(|| format!("Failed to read config file {config_file}"))?;
            let config: Self = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {config_file}"))?;
            Ok((config, ConfigSource::File))
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)
                .with_context(|| format!("Failed to write default config file {config_file}"))?;
            Ok((default_config, ConfigSource::CreatedDefault))
        }
    }

    /// Reject values that would only fail later at runtime
    pub fn validate(&self) -> Result<()> {
        self.web.shutdown_timeout()?;
        self.cache.capacity()?;
        self.origin.connect_timeout()?;
        self.origin.request_timeout()?;

        if !(1..=100).contains(&self.image.jpeg_quality) {
            bail!(
                "image.jpeg_quality must be between 1 and 100, got {}",
                self.image.jpeg_quality
            );
        }
        if self.image.max_dimension == 0 {
            bail!("image.max_dimension must be at least 1");
        }
        if self.cache.path.trim().is_empty() {
            bail!("cache.path must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.web.shutdown_timeout().unwrap(), Duration::from_secs(3));
        assert_eq!(config.cache.capacity().unwrap().get(), DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.image.jpeg_quality, 75);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            capacity = 2

            [web]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.capacity, 2);
        assert_eq!(config.cache.path, DEFAULT_CACHE_PATH);
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, DEFAULT_HOST);
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.image.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.origin.request_timeout = "soon".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let (config, source) = Config::load_from_file(path_str).unwrap();
        assert_eq!(source, ConfigSource::CreatedDefault);
        assert!(path.exists());
        assert_eq!(config.web.port, DEFAULT_PORT);

        let (reloaded, source) = Config::load_from_file(path_str).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(reloaded.cache.path, config.cache.path);
        assert_eq!(reloaded.web.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
    }
}
