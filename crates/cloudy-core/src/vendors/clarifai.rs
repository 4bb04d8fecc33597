//! Clarifai adapter using the v2 predict API against the general model.

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

const NAME: &str = "clarifai";
const API_BASE: &str = "https://api.clarifai.com/v2";
const GENERAL_MODEL: &str = "aaa03c23b3724a16a56b629203edc62c";

/// Clarifai general-model concepts.
pub struct ClarifaiAdapter {
    client: reqwest::Client,
    settings: AdapterSettings,
}

impl ClarifaiAdapter {
    pub fn new(settings: &AdapterSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    outputs: Vec<Output>,
}

#[derive(Deserialize)]
struct Output {
    #[serde(default)]
    data: OutputData,
}

#[derive(Deserialize, Default)]
struct OutputData {
    #[serde(default)]
    concepts: Vec<Concept>,
}

#[derive(Deserialize)]
struct Concept {
    name: String,
    value: f32,
}

#[async_trait]
impl VendorAdapter for ClarifaiAdapter {
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
        let body = json!({
            "inputs": [{"data": {"image": {"base64": encode_base64(&bytes)}}}]
        });

        let resp = self
            .client
            .post(format!("{API_BASE}/models/{GENERAL_MODEL}/outputs"))
            .header("Authorization", format!("Key {key}"))
            .json(&body)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        Ok(RawVendorResult::from_value(json_body(NAME, resp).await?))
    }

    fn standardize(&self, raw: &RawVendorResult) -> Result<StandardizedResult, VendorError> {
        let resp: PredictResponse = parse_shape(NAME, raw)?;
        Ok(resp
            .outputs
            .into_iter()
            .next()
            .map(|o| o.data.concepts)
            .unwrap_or_default()
            .into_iter()
            .map(|c| ScoredTag::scored(c.name, c.value))
            .collect())
    }
}
