//! Vendor credentials and region settings.
//!
//! Loaded once at startup from two JSON documents keyed by vendor name:
//!
//! ```json
//! // api_keys.json
//! { "msft": "abc123", "rekognition": { "api_key": "AKIA...", "api_secret": "${AWS_SECRET}" } }
//! // api_regions.json
//! { "msft": "westeurope", "rekognition": "eu-west-1" }
//! ```
//!
//! String values may be `${ENV_VAR}` references, resolved on access.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, VendorError};

/// Key material for one vendor: a bare key, or a key/secret pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiKey {
    Key(String),
    Pair {
        api_key: String,
        #[serde(default)]
        api_secret: Option<String>,
    },
}

impl ApiKey {
    fn key(&self) -> &str {
        match self {
            Self::Key(key) => key,
            Self::Pair { api_key, .. } => api_key,
        }
    }

    fn secret(&self) -> Option<&str> {
        match self {
            Self::Key(_) => None,
            Self::Pair { api_secret, .. } => api_secret.as_deref(),
        }
    }
}

/// Which piece of key material an adapter needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    ApiKey,
    ApiSecret,
}

impl CredentialField {
    fn name(self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::ApiSecret => "api_secret",
        }
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// API keys and regions for every vendor, passed through to adapters unexamined.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    keys: BTreeMap<String, ApiKey>,
    regions: BTreeMap<String, String>,
}

impl Credentials {
    pub fn new(keys: BTreeMap<String, ApiKey>, regions: BTreeMap<String, String>) -> Self {
        Self { keys, regions }
    }

    /// Load the keys document (required) and the regions document (optional;
    /// adapters fall back to their default region when it is absent).
    pub fn load(keys_path: &Path, regions_path: &Path) -> Result<Self, ConfigError> {
        let keys = read_json(keys_path)?;
        let regions = if regions_path.exists() {
            read_json(regions_path)?
        } else {
            tracing::debug!("No regions file at {:?}, using vendor defaults", regions_path);
            BTreeMap::new()
        };
        Ok(Self { keys, regions })
    }

    fn field(&self, vendor: &str, field: CredentialField) -> Option<String> {
        let entry = self.keys.get(vendor)?;
        let raw = match field {
            CredentialField::ApiKey => entry.key(),
            CredentialField::ApiSecret => entry.secret()?,
        };
        resolve_env_var(raw)
    }

    /// Check at startup that every field a vendor needs resolves.
    pub fn check(&self, vendor: &str, fields: &[CredentialField]) -> Result<(), ConfigError> {
        for &field in fields {
            if self.field(vendor, field).is_none() {
                return Err(ConfigError::MissingCredentials {
                    vendor: vendor.to_string(),
                    field: field.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Fetch a required field at call time.
    pub fn require(&self, vendor: &str, field: CredentialField) -> Result<String, VendorError> {
        self.field(vendor, field).ok_or_else(|| VendorError::Credentials {
            vendor: vendor.to_string(),
            field: field.name().to_string(),
        })
    }

    /// Region (or endpoint) for a vendor, if configured.
    pub fn region(&self, vendor: &str) -> Option<String> {
        self.regions.get(vendor).and_then(|r| resolve_env_var(r))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::JsonError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }

    #[test]
    fn test_load_key_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let keys = dir.path().join("api_keys.json");
        let regions = dir.path().join("api_regions.json");
        std::fs::write(
            &keys,
            r#"{"msft": "k1", "rekognition": {"api_key": "AK", "api_secret": "SK"}}"#,
        )
        .unwrap();
        std::fs::write(&regions, r#"{"rekognition": "eu-west-1"}"#).unwrap();

        let creds = Credentials::load(&keys, &regions).unwrap();
        assert_eq!(creds.require("msft", CredentialField::ApiKey).unwrap(), "k1");
        assert_eq!(
            creds.require("rekognition", CredentialField::ApiSecret).unwrap(),
            "SK"
        );
        assert_eq!(creds.region("rekognition").as_deref(), Some("eu-west-1"));
        assert_eq!(creds.region("msft"), None);
    }

    #[test]
    fn test_regions_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let keys = dir.path().join("api_keys.json");
        std::fs::write(&keys, r#"{"google": "g"}"#).unwrap();
        let creds = Credentials::load(&keys, &dir.path().join("missing.json")).unwrap();
        assert_eq!(creds.region("google"), None);
    }

    #[test]
    fn test_missing_keys_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::load(&dir.path().join("nope.json"), &dir.path().join("r.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_invalid_keys_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let keys = dir.path().join("api_keys.json");
        std::fs::write(&keys, "[1, 2").unwrap();
        let err = Credentials::load(&keys, &dir.path().join("r.json")).unwrap_err();
        assert!(matches!(err, ConfigError::JsonError { .. }));
    }

    #[test]
    fn test_check_reports_missing_secret() {
        let mut keys = BTreeMap::new();
        keys.insert("eyeem".to_string(), ApiKey::Key("id".to_string()));
        let creds = Credentials::new(keys, BTreeMap::new());
        assert!(creds.check("eyeem", &[CredentialField::ApiKey]).is_ok());
        let err = creds
            .check("eyeem", &[CredentialField::ApiKey, CredentialField::ApiSecret])
            .unwrap_err();
        assert!(err.to_string().contains("api_secret"));
        assert!(creds.check("google", &[CredentialField::ApiKey]).is_err());
    }

    #[test]
    fn test_unset_env_reference_counts_as_missing() {
        let mut keys = BTreeMap::new();
        keys.insert(
            "ibm".to_string(),
            ApiKey::Key("${CLOUDY_TEST_UNSET_IBM_KEY}".to_string()),
        );
        let creds = Credentials::new(keys, BTreeMap::new());
        let err = creds.require("ibm", CredentialField::ApiKey).unwrap_err();
        assert!(matches!(err, VendorError::Credentials { .. }));
    }
}
