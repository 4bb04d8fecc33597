//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "input.extensions must not be empty".into(),
            ));
        }
        if self.input.extensions.iter().any(|e| e.is_empty() || e.starts_with('.')) {
            return Err(ConfigError::ValidationError(
                "input.extensions entries must be bare suffixes like \"jpg\"".into(),
            ));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.poll_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.poll_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.poll_interval_ms must be > 0".into(),
            ));
        }
        if self.output.resize && self.output.image_height == 0 {
            return Err(ConfigError::ValidationError(
                "output.image_height must be > 0 when output.resize is set".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"json\" or \"jsonl\", got {:?}",
                self.output.format
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}
