//! Ground-truth tags: a JSON object mapping image file name to expected tags.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::ConfigError;

/// Expected tags per image, loaded once and never written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruth {
    tags: BTreeMap<String, BTreeSet<String>>,
}

impl GroundTruth {
    /// Load from a JSON file such as `{"cat.jpg": ["animal", "cat"]}`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&content).map_err(|source| ConfigError::JsonError {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!("Loaded ground truth for {} images from {:?}", raw.len(), path);
        Ok(Self::from_map(raw))
    }

    pub fn from_map(raw: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            tags: raw
                .into_iter()
                .map(|(name, tags)| (name, tags.into_iter().collect()))
                .collect(),
        }
    }

    /// Expected tags for an image; empty when the image is not listed.
    pub fn tags_for(&self, file_name: &str) -> BTreeSet<String> {
        self.tags.get(file_name).cloned().unwrap_or_default()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.tags.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
