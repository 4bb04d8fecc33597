//! Sub-configuration structs with defaults.

use crate::stats::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the image corpus
    pub input_dir: PathBuf,

    /// Directory for cached vendor results, copied images and reports
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_images"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Corpus discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// File suffixes treated as images (matched case-sensitively)
    pub extensions: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: ["png", "jpg", "jpeg", "gif", "bmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Ground-truth tag file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundTruthConfig {
    /// Score vendors against expected tags
    pub enabled: bool,

    /// JSON file mapping image filename to expected tags
    pub path: PathBuf,
}

impl Default for GroundTruthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("tags.json"),
        }
    }
}

/// Locations of the vendor credential documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// JSON file mapping vendor name to an API key or `{api_key, api_secret}`
    pub keys_path: PathBuf,

    /// JSON file mapping vendor name to a region or endpoint
    pub regions_path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            keys_path: PathBuf::from("api_keys.json"),
            regions_path: PathBuf::from("api_regions.json"),
        }
    }
}

/// Vendor selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorsConfig {
    /// Vendors to benchmark; empty means every registered vendor
    pub enabled: Vec<String>,
}

/// Scheduling settings for live vendor calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause after each live vendor call, in milliseconds
    pub rate_limit_ms: u64,

    /// Per-vendor overrides of `rate_limit_ms`
    pub vendor_delays_ms: BTreeMap<String, u64>,

    /// Retries for transient call failures (timeouts, 429, 5xx)
    pub retry_attempts: u32,

    /// Base delay for exponential retry backoff in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: 1000,
            vendor_delays_ms: BTreeMap::new(),
            retry_attempts: 0,
            retry_delay_ms: 1000,
        }
    }
}

/// Timeouts applied inside vendor adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-request HTTP timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Upper bound on polling for asynchronous vendor protocols
    pub poll_timeout_ms: u64,

    /// Interval between polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 60_000,
            poll_timeout_ms: 60_000,
            poll_interval_ms: 1000,
        }
    }
}

/// Statistics to compute per vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Metrics to summarize; matching metrics are skipped without ground truth
    pub metrics: Vec<Metric>,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            metrics: Metric::ALL.to_vec(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Copy each input image into the output directory
    pub copy_images: bool,

    /// Resize copied images to `image_height` instead of copying verbatim
    pub resize: bool,

    /// Height of resized output images in pixels
    pub image_height: u32,

    /// Report format ("json" or "jsonl")
    pub format: String,

    /// Also write a CSV export with one row per (image, vendor) pair
    pub csv: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            copy_images: true,
            resize: false,
            image_height: 200,
            format: "json".to_string(),
            csv: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
