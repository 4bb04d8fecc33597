//! Vendor adapters for third-party image-tagging services.
//!
//! Each vendor implements [`VendorAdapter`]: a raw network call that returns
//! the vendor's JSON untouched, and a pure normalization into the common
//! `{tags: [(label, confidence)]}` schema. Adapters never cache and never
//! throttle; the orchestrator does both.

pub(crate) mod adapter;
pub(crate) mod clarifai;
pub(crate) mod cloudsight;
pub(crate) mod credentials;
pub(crate) mod eyeem;
pub(crate) mod google;
pub(crate) mod ibm;
pub(crate) mod microsoft;
pub(crate) mod registry;
pub(crate) mod rekognition;
pub(crate) mod retry;
pub(crate) mod sigv4;

pub use adapter::{AdapterSettings, VendorAdapter};
pub use credentials::{resolve_env_var, ApiKey, CredentialField, Credentials};
pub use registry::VendorRegistry;
pub use retry::{backoff_duration, is_retryable};
