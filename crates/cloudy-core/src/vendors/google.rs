//! Google Cloud Vision adapter.
//!
//! Sends the image base64-encoded in an `images:annotate` request asking for
//! `LABEL_DETECTION`. The API key goes in the query string.

use super::adapter::{
    encode_base64, json_body, parse_shape, read_image, request_failed, AdapterSettings,
    VendorAdapter,
};
use super::credentials::{CredentialField, Credentials};
use crate::error::VendorError;
use crate::types::{RawVendorResult, ScoredTag, StandardizedResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

const NAME: &str = "google";
const ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
const MAX_RESULTS: u32 = 20;

/// Google Cloud Vision label detection.
pub struct GoogleAdapter {
    client: reqwest::Client,
    settings: AdapterSettings,
}

impl GoogleAdapter {
    pub fn new(settings: &AdapterSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "maxResults")]
    max_results: u32,
}

// --- Response types ---

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default, rename = "labelAnnotations")]
    label_annotations: Vec<Label>,
}

#[derive(Deserialize)]
struct Label {
    description: String,
    score: f32,
}

#[async_trait]
impl VendorAdapter for GoogleAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(
        &self,
        image_path: &Path,
        credentials: &Credentials,
    ) -> Result<RawVendorResult, VendorError> {
        let key = credentials.require(NAME, CredentialField::ApiKey)?;
        let bytes = read_image(NAME, image_path).await?;

        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: encode_base64(&bytes),
                },
                features: vec![Feature {
                    kind: "LABEL_DETECTION",
                    max_results: MAX_RESULTS,
                }],
            }],
        };

        let resp = self
            .client
            .post(ENDPOINT)
            .query(&[("key", key.as_str())])
            .json(&body)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        Ok(RawVendorResult::from_value(json_body(NAME, resp).await?))
    }

    fn standardize(&self, raw: &RawVendorResult) -> Result<StandardizedResult, VendorError> {
        let resp: AnnotateResponse = parse_shape(NAME, raw)?;
        Ok(resp
            .responses
            .into_iter()
            .next()
            .map(|r| r.label_annotations)
            .unwrap_or_default()
            .into_iter()
            .map(|l| ScoredTag::scored(l.description, l.score))
            .collect())
    }
}
