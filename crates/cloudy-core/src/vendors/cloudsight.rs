//! CloudSight adapter.
//!
//! CloudSight describes an image with a single caption rather than scored
//! tags. The protocol has two steps: submit the image and receive a token,
//! then poll the token until its status leaves "not completed". Polling is
//! bounded by `limits.poll_timeout_ms`.

use super::adapter::{
    json_body, parse_shape, read_image, request_failed, upload_name, AdapterSettings,
    VendorAdapter,
};
use super::credentials::{CredentialField, Credentials};
use crate::error::VendorError;
use crate::types::{RawVendorResult, StandardizedResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tokio::time::Instant;

const NAME: &str = "cloudsight";
const API_BASE: &str = "https://api.cloudsightapi.com";
const PENDING: &str = "not completed";
const LOCALE: &str = "en-US";

/// CloudSight image captioning.
pub struct CloudSightAdapter {
    client: reqwest::Client,
    settings: AdapterSettings,
}

impl CloudSightAdapter {
    pub fn new(settings: &AdapterSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }

    async fn submit(&self, image_path: &Path, auth: &str) -> Result<String, VendorError> {
        let bytes = read_image(NAME, image_path).await?;
        let (file_name, mime) = upload_name(image_path);
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| request_failed(NAME, e))?;
        let form = Form::new()
            .part("image_request[image]", part)
            .text("image_request[locale]", LOCALE);

        let resp = self
            .client
            .post(format!("{API_BASE}/image_requests"))
            .header("Authorization", auth)
            .multipart(form)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        let body = json_body(NAME, resp).await?;
        body.get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| VendorError::call(NAME, "submit response has no token"))
    }

    async fn poll(&self, token: &str, auth: &str) -> Result<Value, VendorError> {
        let started = Instant::now();
        loop {
            let resp = self
                .client
                .get(format!("{API_BASE}/image_responses/{token}"))
                .header("Authorization", auth)
                .timeout(self.settings.request_timeout)
                .send()
                .await
                .map_err(|e| request_failed(NAME, e))?;
            let body = json_body(NAME, resp).await?;

            if body.get("status").and_then(Value::as_str) != Some(PENDING) {
                return Ok(body);
            }
            if started.elapsed() + self.settings.poll_interval > self.settings.poll_timeout {
                return Err(VendorError::Timeout {
                    vendor: NAME.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            tracing::debug!(vendor = NAME, token, "still processing, polling again");
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

#[derive(Deserialize)]
struct ImageResponse {
    status: Option<String>,
    name: Option<String>,
    reason: Option<String>,
}

/// Map a final response onto a single synthetic tag.
fn status_tag(resp: ImageResponse) -> Option<String> {
    match resp.status?.as_str() {
        "completed" => resp.name,
        "skipped" => Some(format!(
            "error_skipped_because_{}",
            resp.reason.as_deref().unwrap_or("unknown")
        )),
        other => Some(format!("error_{other}")),
    }
}

#[async_trait]
impl VendorAdapter for CloudSightAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(
        &self,
        image_path: &Path,
        credentials: &Credentials,
    ) -> Result<RawVendorResult, VendorError> {
        let key = credentials.require(NAME, CredentialField::ApiKey)?;
        let auth = format!("CloudSight {key}");

        let token = self.submit(image_path, &auth).await?;
        tracing::debug!(vendor = NAME, token = %token, "image submitted");
        let body = self.poll(&token, &auth).await?;

        Ok(RawVendorResult::from_value(body))
    }

    fn standardize(&self, raw: &RawVendorResult) -> Result<StandardizedResult, VendorError> {
        let resp: ImageResponse = parse_shape(NAME, raw)?;
        Ok(match status_tag(resp) {
            Some(tag) => StandardizedResult::error_marker(tag),
            None => StandardizedResult::empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels(raw: Value) -> Vec<(String, Option<f32>)> {
        CloudSightAdapter::new(&AdapterSettings::default())
            .normalize(&RawVendorResult::from_value(raw))
            .tags()
            .iter()
            .map(|t| (t.label().to_string(), t.confidence()))
            .collect()
    }

    #[test]
    fn test_completed_yields_caption_without_confidence() {
        assert_eq!(
            labels(json!({"status": "completed", "name": "black cat on sofa", "token": "t"})),
            vec![("black cat on sofa".to_string(), None)]
        );
    }

    #[test]
    fn test_skipped_yields_reason_marker() {
        assert_eq!(
            labels(json!({"status": "skipped", "reason": "offensive"})),
            vec![("error_skipped_because_offensive".to_string(), None)]
        );
    }

    #[test]
    fn test_other_status_yields_status_marker() {
        assert_eq!(
            labels(json!({"status": "timeout"})),
            vec![("error_timeout".to_string(), None)]
        );
    }

    #[test]
    fn test_missing_status_is_empty() {
        assert!(labels(json!({"response_time": 3.0})).is_empty());
    }
}
