//! Vendor adapter trait and shared request helpers.
//!
//! Defines the interface every image-tagging vendor implements: a raw
//! network call and a pure normalization into the common tag schema.

use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use super::credentials::{CredentialField, Credentials};
use crate::config::Config;
use crate::error::{ConfigError, VendorError};
use crate::types::{RawVendorResult, StandardizedResult};

/// Timeouts shared by all HTTP adapters.
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Upper bound on polling in multi-step protocols
    pub poll_timeout: Duration,
    /// Interval between polls
    pub poll_interval: Duration,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            poll_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl AdapterSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            poll_timeout: Duration::from_millis(config.limits.poll_timeout_ms),
            poll_interval: Duration::from_millis(config.limits.poll_interval_ms),
        }
    }
}

/// Trait that all vendor adapters implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the registry holds `Arc<dyn VendorAdapter>`).
#[async_trait]
pub trait VendorAdapter: Send + Sync {
    /// Vendor name, used for cache keys, logging and reports (e.g., "msft").
    fn name(&self) -> &str;

    /// Key material this vendor needs.
    fn required_credentials(&self) -> &'static [CredentialField] {
        &[CredentialField::ApiKey]
    }

    /// Startup check that the credentials this vendor needs are present.
    fn check_credentials(&self, credentials: &Credentials) -> Result<(), ConfigError> {
        credentials.check(self.name(), self.required_credentials())
    }

    /// Send the image to the vendor and return its raw response.
    ///
    /// Must not cache and must not throttle; both belong to the caller.
    async fn call(
        &self,
        image_path: &Path,
        credentials: &Credentials,
    ) -> Result<RawVendorResult, VendorError>;

    /// Convert a raw response into the common tag schema.
    ///
    /// A missing label field yields an empty result; a malformed shape is a
    /// `VendorError::Protocol`.
    fn standardize(&self, raw: &RawVendorResult) -> Result<StandardizedResult, VendorError>;

    /// Like [`standardize`](Self::standardize), but malformed payloads degrade
    /// to an empty result instead of failing.
    fn normalize(&self, raw: &RawVendorResult) -> StandardizedResult {
        match self.standardize(raw) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(vendor = self.name(), "{e}, treating as no tags");
                StandardizedResult::empty()
            }
        }
    }
}

/// Read an image for upload.
pub(crate) async fn read_image(vendor: &str, path: &Path) -> Result<Vec<u8>, VendorError> {
    tokio::fs::read(path).await.map_err(|source| VendorError::Image {
        vendor: vendor.to_string(),
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// File name and MIME type for multipart uploads.
pub(crate) fn upload_name(path: &Path) -> (String, &'static str) {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();
    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    };
    (file_name, mime)
}

/// Map a transport failure into a call error.
pub(crate) fn request_failed(vendor: &str, e: reqwest::Error) -> VendorError {
    VendorError::Call {
        vendor: vendor.to_string(),
        message: format!("request failed: {e}"),
        status_code: e.status().map(|s| s.as_u16()),
    }
}

/// Reject non-success responses, keeping the status and body for the log.
pub(crate) async fn check_status(
    vendor: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, VendorError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(VendorError::Call {
        vendor: vendor.to_string(),
        message: format!("HTTP {status}: {text}"),
        status_code: Some(status.as_u16()),
    })
}

/// Check the status and parse the body as JSON.
pub(crate) async fn json_body(vendor: &str, resp: reqwest::Response) -> Result<Value, VendorError> {
    let resp = check_status(vendor, resp).await?;
    resp.json::<Value>()
        .await
        .map_err(|e| VendorError::call(vendor, format!("failed to parse response: {e}")))
}

/// Deserialize a raw result into a vendor-specific response shape.
pub(crate) fn parse_shape<T: DeserializeOwned>(
    vendor: &str,
    raw: &RawVendorResult,
) -> Result<T, VendorError> {
    serde_json::from_value(raw.as_value()).map_err(|e| VendorError::protocol(vendor, e.to_string()))
}
