//! IBM Watson Visual Recognition adapter.
//!
//! Uploads the image as multipart form data to `v3/classify`, authenticating
//! with HTTP basic auth (`apikey:<key>`). A configured region is treated as
//! the service URL for the instance.

use super::adapter::{
    json_body, parse_shape, read_image, request_failed, upload_name, AdapterSettings,
    VendorAdapter,
};
use super::credentials::{CredentialField, Credentials};
use crate::error::VendorError;
use crate::types::{RawVendorResult, ScoredTag, StandardizedResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;

const NAME: &str = "ibm";
const DEFAULT_URL: &str = "https://gateway.watsonplatform.net/visual-recognition/api";
const API_VERSION: &str = "2018-03-19";

/// IBM Watson default classifier.
pub struct IbmAdapter {
    client: reqwest::Client,
    settings: AdapterSettings,
}

impl IbmAdapter {
    pub fn new(settings: &AdapterSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    images: Vec<ClassifiedImage>,
}

#[derive(Deserialize)]
struct ClassifiedImage {
    #[serde(default)]
    classifiers: Vec<Classifier>,
}

#[derive(Deserialize)]
struct Classifier {
    #[serde(default)]
    classes: Vec<Class>,
}

#[derive(Deserialize)]
struct Class {
    class: String,
    score: f32,
}

#[async_trait]
impl VendorAdapter for IbmAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(
        &self,
        image_path: &Path,
        credentials: &Credentials,
    ) -> Result<RawVendorResult, VendorError> {
        let key = credentials.require(NAME, CredentialField::ApiKey)?;
        let base = credentials
            .region(NAME)
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let bytes = read_image(NAME, image_path).await?;
        let (file_name, mime) = upload_name(image_path);

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| request_failed(NAME, e))?;
        let form = Form::new().part("images_file", part);

        let resp = self
            .client
            .post(format!("{}/v3/classify", base.trim_end_matches('/')))
            .query(&[("version", API_VERSION)])
            .basic_auth("apikey", Some(key))
            .multipart(form)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        Ok(RawVendorResult::from_value(json_body(NAME, resp).await?))
    }

    fn standardize(&self, raw: &RawVendorResult) -> Result<StandardizedResult, VendorError> {
        let resp: ClassifyResponse = parse_shape(NAME, raw)?;
        let image = match resp.images.into_iter().next() {
            Some(image) => image,
            None => return Ok(StandardizedResult::empty()),
        };
        Ok(image
            .classifiers
            .into_iter()
            .flat_map(|c| c.classes)
            .map(|c| ScoredTag::scored(c.class, c.score))
            .collect())
    }
}
