//! Configuration management for Cloudy.
//!
//! Configuration is read once at startup from `cloudy.toml` and passed by
//! reference from then on. All config structs implement `Default`, so an
//! empty or missing file yields a working setup.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "cloudy.toml";

/// Root configuration structure for Cloudy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Corpus and output locations
    pub general: GeneralConfig,

    /// Corpus discovery
    pub input: InputConfig,

    /// Ground-truth tags
    pub ground_truth: GroundTruthConfig,

    /// Vendor credential documents
    pub credentials: CredentialsConfig,

    /// Vendor selection
    pub vendors: VendorsConfig,

    /// Rate limiting and retries
    pub pipeline: PipelineConfig,

    /// Adapter timeouts
    pub limits: LimitsConfig,

    /// Per-vendor statistics
    pub statistics: StatisticsConfig,

    /// Report and image output
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the first location that exists:
    /// `./cloudy.toml`, then the platform config directory.
    ///
    /// Returns default configuration if neither exists.
    pub fn load() -> Result<Self, ConfigError> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(&local);
        }
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.cloudy.cloudy/config.toml
    /// - Linux: ~/.config/cloudy/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\cloudy\config\config.toml
    ///
    /// Falls back to ~/.cloudy/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "cloudy", "cloudy")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".cloudy").join("config.toml")
            })
    }

    /// Resolved input directory (with ~ expansion).
    pub fn input_dir(&self) -> PathBuf {
        expand(&self.general.input_dir)
    }

    /// Resolved output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        expand(&self.general.output_dir)
    }

    /// Resolved ground-truth file path (with ~ expansion).
    pub fn ground_truth_path(&self) -> PathBuf {
        expand(&self.ground_truth.path)
    }

    /// Resolved API keys file path (with ~ expansion).
    pub fn keys_path(&self) -> PathBuf {
        expand(&self.credentials.keys_path)
    }

    /// Resolved API regions file path (with ~ expansion).
    pub fn regions_path(&self) -> PathBuf {
        expand(&self.credentials.regions_path)
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.limits.request_timeout_ms)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Metric;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.rate_limit_ms, 1000);
        assert_eq!(config.pipeline.retry_attempts, 0);
        assert!(config.ground_truth.enabled);
        assert_eq!(config.input.extensions.len(), 5);
        assert_eq!(config.statistics.metrics, Metric::ALL.to_vec());
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[pipeline]"));
        assert!(toml.contains("matching_confidence"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [general]
            input_dir = "corpus"

            [pipeline]
            rate_limit_ms = 250

            [pipeline.vendor_delays_ms]
            cloudsight = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.general.input_dir, PathBuf::from("corpus"));
        assert_eq!(config.general.output_dir, PathBuf::from("output"));
        assert_eq!(config.pipeline.rate_limit_ms, 250);
        assert_eq!(config.pipeline.vendor_delays_ms.get("cloudsight"), Some(&5000));
        assert_eq!(config.limits.request_timeout_ms, 60_000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloudy.toml");
        std::fs::write(
            &path,
            "[statistics]\nmetrics = [\"response_time\"]\n[vendors]\nenabled = [\"msft\"]\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.statistics.metrics, vec![Metric::ResponseTime]);
        assert_eq!(config.vendors.enabled, vec!["msft".to_string()]);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/cloudy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_tilde_expansion() {
        let mut config = Config::default();
        config.general.output_dir = PathBuf::from("~/bench/output");
        assert!(!config.output_dir().to_string_lossy().starts_with('~'));
    }
}
