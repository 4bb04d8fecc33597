//! Microsoft Computer Vision adapter.
//!
//! Posts the raw image bytes to the regional `analyze` endpoint with
//! `visualFeatures=Tags`.

use super::adapter::{json_body, parse_shape, read_image, request_failed, AdapterSettings, VendorAdapter};
use super::credentials::{CredentialField, Credentials};
use crate::error::VendorError;
use crate::types::{RawVendorResult, ScoredTag, StandardizedResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

const NAME: &str = "msft";
const DEFAULT_REGION: &str = "westcentralus";

/// Microsoft Cognitive Services vision adapter.
pub struct MicrosoftAdapter {
    client: reqwest::Client,
    settings: AdapterSettings,
}

impl MicrosoftAdapter {
    pub fn new(settings: &AdapterSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }

    /// Analyze URL for a region name or a full endpoint override.
    fn endpoint(region: Option<&str>) -> String {
        match region {
            Some(base) if base.starts_with("http") => {
                format!("{}/vision/v1.0/analyze", base.trim_end_matches('/'))
            }
            Some(region) => format!("https://{region}.api.cognitive.microsoft.com/vision/v1.0/analyze"),
            None => format!("https://{DEFAULT_REGION}.api.cognitive.microsoft.com/vision/v1.0/analyze"),
        }
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
struct Tag {
    name: String,
    confidence: f32,
}

#[async_trait]
impl VendorAdapter for MicrosoftAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(
        &self,
        image_path: &Path,
        credentials: &Credentials,
    ) -> Result<RawVendorResult, VendorError> {
        let key = credentials.require(NAME, CredentialField::ApiKey)?;
        let region = credentials.region(NAME);
        let bytes = read_image(NAME, image_path).await?;

        let resp = self
            .client
            .post(Self::endpoint(region.as_deref()))
            .query(&[("visualFeatures", "Tags")])
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        Ok(RawVendorResult::from_value(json_body(NAME, resp).await?))
    }

    fn standardize(&self, raw: &RawVendorResult) -> Result<StandardizedResult, VendorError> {
        let resp: AnalyzeResponse = parse_shape(NAME, raw)?;
        Ok(resp
            .tags
            .into_iter()
            .map(|t| ScoredTag::scored(t.name, t.confidence))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> MicrosoftAdapter {
        MicrosoftAdapter::new(&AdapterSettings::default())
    }

    #[test]
    fn test_standardize_tags() {
        let raw = RawVendorResult::from_value(json!({
            "tags": [{"name": "cat", "confidence": 0.98}, {"name": "indoor", "confidence": 0.5}],
            "requestId": "abc",
            "response_time": 0.7
        }));
        let result = adapter().normalize(&raw);
        assert_eq!(result.len(), 2);
        assert_eq!(result.tags()[0], ScoredTag::scored("cat", 0.98));
    }

    #[test]
    fn test_missing_tags_is_empty() {
        let raw = RawVendorResult::from_value(json!({"requestId": "abc", "response_time": 0.7}));
        assert!(adapter().standardize(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_tags_degrade_to_empty() {
        let raw = RawVendorResult::from_value(json!({"tags": "nope"}));
        assert!(adapter().standardize(&raw).is_err());
        assert!(adapter().normalize(&raw).is_empty());
    }

    #[test]
    fn test_endpoint_from_region() {
        assert_eq!(
            MicrosoftAdapter::endpoint(None),
            "https://westcentralus.api.cognitive.microsoft.com/vision/v1.0/analyze"
        );
        assert_eq!(
            MicrosoftAdapter::endpoint(Some("westeurope")),
            "https://westeurope.api.cognitive.microsoft.com/vision/v1.0/analyze"
        );
        assert_eq!(
            MicrosoftAdapter::endpoint(Some("http://localhost:9000/")),
            "http://localhost:9000/vision/v1.0/analyze"
        );
    }
}
