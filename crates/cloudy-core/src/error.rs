//! Error types for the Cloudy benchmarking pipeline.
//!
//! Errors are organized by recovery policy: vendor errors are recovered per
//! (image, vendor) pair, while cache and configuration errors abort the run.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Cloudy operations.
#[derive(Error, Debug)]
pub enum CloudyError {
    /// Configuration-related errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Result cache errors (fatal, the run cannot record progress)
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Vendor errors that escaped per-pair recovery
    #[error("Vendor error: {0}")]
    Vendor(#[from] VendorError),

    /// Report sink errors
    #[error("Report error: {0}")]
    Report(String),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a config, credentials or ground-truth file from disk
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to parse a JSON input document
    #[error("Failed to parse {path}: {source}")]
    JsonError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A configured vendor is not registered
    #[error("Unknown vendor: {0}")]
    UnknownVendor(String),

    /// Credentials for a configured vendor are missing or incomplete
    #[error("Missing credentials for {vendor}: {field}")]
    MissingCredentials { vendor: String, field: String },
}

/// Result cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The storage root could not be created
    #[error("Cannot create cache root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache entry exists but could not be read
    #[error("Failed to read cache entry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache entry could not be written
    #[error("Failed to write cache entry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache entry exists but is not a JSON object
    #[error("Corrupt cache entry {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Vendor adapter errors.
#[derive(Error, Debug)]
pub enum VendorError {
    /// Network, auth or non-success HTTP status during `call`
    #[error("{vendor} call failed: {message}")]
    Call {
        vendor: String,
        message: String,
        /// HTTP status code, when the failure came from a response
        status_code: Option<u16>,
    },

    /// A bounded wait inside a multi-step protocol ran out
    #[error("{vendor} timed out after {waited_ms}ms")]
    Timeout { vendor: String, waited_ms: u64 },

    /// The image could not be read from disk
    #[error("{vendor} could not read image {path}: {source}")]
    Image {
        vendor: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Credentials were missing when the call was attempted
    #[error("{vendor} credentials missing: {field}")]
    Credentials { vendor: String, field: String },

    /// Malformed or unexpected raw response shape during normalization
    #[error("{vendor} returned an unexpected response shape: {message}")]
    Protocol { vendor: String, message: String },
}

impl VendorError {
    /// Name of the vendor this error belongs to.
    pub fn vendor(&self) -> &str {
        match self {
            Self::Call { vendor, .. }
            | Self::Timeout { vendor, .. }
            | Self::Image { vendor, .. }
            | Self::Credentials { vendor, .. }
            | Self::Protocol { vendor, .. } => vendor,
        }
    }

    pub(crate) fn call(vendor: &str, message: impl Into<String>) -> Self {
        Self::Call {
            vendor: vendor.to_string(),
            message: message.into(),
            status_code: None,
        }
    }

    pub(crate) fn protocol(vendor: &str, message: impl Into<String>) -> Self {
        Self::Protocol {
            vendor: vendor.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Cloudy results.
pub type Result<T> = std::result::Result<T, CloudyError>;
