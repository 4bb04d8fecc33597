//! The `cloudy vendors` command: list adapters and their credential status.

use cloudy_core::{AdapterSettings, Config, Credentials, VendorRegistry};
use std::path::Path;

/// Execute the vendors command.
pub fn execute(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let registry = VendorRegistry::builtin(&AdapterSettings::from_config(&config));

    let keys_path = config.keys_path();
    let credentials = if keys_path.exists() {
        Credentials::load(&keys_path, &config.regions_path())?
    } else {
        tracing::warn!("No API keys file at {}", keys_path.display());
        Credentials::default()
    };

    print!("{}", format_vendors(&registry, &credentials, &config));
    Ok(())
}

/// One line per built-in vendor: name, enabled flag, credential status.
fn format_vendors(registry: &VendorRegistry, credentials: &Credentials, config: &Config) -> String {
    let enabled = &config.vendors.enabled;
    let mut out = String::new();
    for adapter in registry.adapters() {
        let name = adapter.name();
        let selected = enabled.is_empty() || enabled.iter().any(|v| v == name);
        let status = match adapter.check_credentials(credentials) {
            Ok(()) => "ok".to_string(),
            Err(e) => e.to_string(),
        };
        out.push_str(&format!(
            "{:<12} {:<9} {}\n",
            name,
            if selected { "enabled" } else { "-" },
            status
        ));
    }
    out
}
