//! Name-to-adapter registry.
//!
//! The orchestrator only ever sees `Arc<dyn VendorAdapter>`; new vendors are
//! added here.

use super::adapter::{AdapterSettings, VendorAdapter};
use super::clarifai::ClarifaiAdapter;
use super::cloudsight::CloudSightAdapter;
use super::credentials::Credentials;
use super::eyeem::EyeEmAdapter;
use super::google::GoogleAdapter;
use super::ibm::IbmAdapter;
use super::microsoft::MicrosoftAdapter;
use super::rekognition::RekognitionAdapter;
use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registered vendor adapters, iterated in name order.
#[derive(Clone, Default)]
pub struct VendorRegistry {
    adapters: BTreeMap<String, Arc<dyn VendorAdapter>>,
}

impl VendorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in vendor.
    pub fn builtin(settings: &AdapterSettings) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ClarifaiAdapter::new(settings)));
        registry.register(Arc::new(CloudSightAdapter::new(settings)));
        registry.register(Arc::new(EyeEmAdapter::new(settings)));
        registry.register(Arc::new(GoogleAdapter::new(settings)));
        registry.register(Arc::new(IbmAdapter::new(settings)));
        registry.register(Arc::new(MicrosoftAdapter::new(settings)));
        registry.register(Arc::new(RekognitionAdapter::new(settings)));
        registry
    }

    /// Add an adapter, replacing any previous one with the same name.
    pub fn register(&mut self, adapter: Arc<dyn VendorAdapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn VendorAdapter>> {
        self.adapters.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Adapters in name order.
    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn VendorAdapter>> {
        self.adapters.values()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Restrict to the named vendors. An empty selection keeps every vendor.
    pub fn select(&self, names: &[String]) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Ok(self.clone());
        }
        let mut selected = Self::new();
        for name in names {
            let adapter = self
                .get(name)
                .ok_or_else(|| ConfigError::UnknownVendor(name.clone()))?;
            selected.register(Arc::clone(adapter));
        }
        Ok(selected)
    }

    /// Check every adapter's credentials, failing on the first gap.
    pub fn check_credentials(&self, credentials: &Credentials) -> Result<(), ConfigError> {
        self.adapters()
            .try_for_each(|adapter| adapter.check_credentials(credentials))
    }
}
