//! EyeEm Vision adapter.
//!
//! Exchanges the client id and secret for an access token, then posts the
//! base64 image to `analyze` with a `TAGS` task. A fresh token is requested
//! per call.

use super::adapter::{
    encode_base64, json_body, parse_shape, read_image, request_failed, AdapterSettings,
    VendorAdapter,
};
use super::credentials::{CredentialField, Credentials};
use crate::error::VendorError;
use crate::types::{RawVendorResult, ScoredTag, StandardizedResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

const NAME: &str = "eyeem";
const TOKEN_URL: &str = "https://vision-api.eyeem.com/v1/token";
const ANALYZE_URL: &str = "https://vision-api.eyeem.com/v1/analyze";

/// EyeEm Vision tagging.
pub struct EyeEmAdapter {
    client: reqwest::Client,
    settings: AdapterSettings,
}

impl EyeEmAdapter {
    pub fn new(settings: &AdapterSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }

    async fn access_token(&self, client_id: &str, client_secret: &str) -> Result<String, VendorError> {
        let resp = self
            .client
            .post(TOKEN_URL)
            .form(&[("clientId", client_id), ("clientSecret", client_secret)])
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        let token: TokenResponse = serde_json::from_value(json_body(NAME, resp).await?)
            .map_err(|e| VendorError::call(NAME, format!("invalid token response: {e}")))?;
        Ok(token.access_token)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    responses: Vec<TaskResponse>,
}

#[derive(Deserialize)]
struct TaskResponse {
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
struct Tag {
    text: String,
    probability: f32,
}

#[async_trait]
impl VendorAdapter for EyeEmAdapter {
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
        let client_id = credentials.require(NAME, CredentialField::ApiKey)?;
        let client_secret = credentials.require(NAME, CredentialField::ApiSecret)?;
        let bytes = read_image(NAME, image_path).await?;

        let token = self.access_token(&client_id, &client_secret).await?;
        let body = json!({
            "requests": [{
                "tasks": [{"type": "TAGS"}],
                "image": {"content": encode_base64(&bytes)}
            }]
        });

        let resp = self
            .client
            .post(ANALYZE_URL)
            .bearer_auth(token)
            .json(&body)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        Ok(RawVendorResult::from_value(json_body(NAME, resp).await?))
    }

    fn standardize(&self, raw: &RawVendorResult) -> Result<StandardizedResult, VendorError> {
        let resp: AnalyzeResponse = parse_shape(NAME, raw)?;
        Ok(resp
            .responses
            .into_iter()
            .next()
            .map(|r| r.tags)
            .unwrap_or_default()
            .into_iter()
            .map(|t| ScoredTag::scored(t.text, t.probability))
            .collect())
    }
}
