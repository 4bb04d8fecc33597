//! Amazon Rekognition adapter.
//!
//! Calls `DetectLabels` over the AWS JSON 1.1 protocol with a SigV4-signed
//! request. Needs both an access key and a secret; the region defaults to
//! `us-east-1`. Rekognition reports confidence as a percentage.

use super::adapter::{
    encode_base64, json_body, parse_shape, read_image, request_failed, AdapterSettings,
    VendorAdapter,
};
use super::credentials::{CredentialField, Credentials};
use super::sigv4::{sign_post, SigningKey};
use crate::error::VendorError;
use crate::types::{RawVendorResult, ScoredTag, StandardizedResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

const NAME: &str = "rekognition";
const SERVICE: &str = "rekognition";
const DEFAULT_REGION: &str = "us-east-1";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET: &str = "RekognitionService.DetectLabels";

/// Amazon Rekognition label detection.
pub struct RekognitionAdapter {
    client: reqwest::Client,
    settings: AdapterSettings,
}

impl RekognitionAdapter {
    pub fn new(settings: &AdapterSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }
}

#[derive(Deserialize)]
struct DetectLabelsResponse {
    #[serde(default, rename = "Labels")]
    labels: Vec<Label>,
}

#[derive(Deserialize)]
struct Label {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Confidence")]
    confidence: f32,
}

#[async_trait]
impl VendorAdapter for RekognitionAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn required_credentials(&self) -> &'static [CredentialField] {
        &[CredentialField::ApiKey, CredentialField::ApiSecret]
    }

    async fn call(
        &self,
        image_path: &Path,
        credentials: &Credentials,
    ) -> Result<RawVendorResult, VendorError> {
        let access_key = credentials.require(NAME, CredentialField::ApiKey)?;
        let secret_key = credentials.require(NAME, CredentialField::ApiSecret)?;
        let region = credentials
            .region(NAME)
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let host = format!("{SERVICE}.{region}.amazonaws.com");

        let bytes = read_image(NAME, image_path).await?;
        let payload = serde_json::to_vec(&json!({"Image": {"Bytes": encode_base64(&bytes)}}))
            .map_err(|e| VendorError::call(NAME, format!("failed to encode request: {e}")))?;

        let signature = sign_post(
            &SigningKey {
                access_key: &access_key,
                secret_key: &secret_key,
                region: &region,
                service: SERVICE,
            },
            &host,
            &[("content-type", CONTENT_TYPE), ("x-amz-target", TARGET)],
            &payload,
            chrono::Utc::now(),
        )
        .map_err(|e| VendorError::call(NAME, format!("failed to sign request: {e}")))?;

        let resp = self
            .client
            .post(format!("https://{host}/"))
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", TARGET)
            .header("X-Amz-Date", signature.amz_date)
            .header("Authorization", signature.authorization)
            .body(payload)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        Ok(RawVendorResult::from_value(json_body(NAME, resp).await?))
    }

    fn standardize(&self, raw: &RawVendorResult) -> Result<StandardizedResult, VendorError> {
        let resp: DetectLabelsResponse = parse_shape(NAME, raw)?;
        Ok(resp
            .labels
            .into_iter()
            .map(|l| ScoredTag::scored(l.name, l.confidence / 100.0))
            .collect())
    }
}
