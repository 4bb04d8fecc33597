//! CLI command implementations.

pub mod config;
pub mod run;
pub mod vendors;

use cloudy_core::Config;
use std::path::Path;

/// Load configuration from `--config` when given, otherwise from the
/// default lookup locations.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}
