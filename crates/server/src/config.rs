//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings read from `VMCOST_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name attached to every log event
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// JSON inventory file; the built-in sample fleet is used when unset
    #[serde(default)]
    pub inventory_path: Option<String>,

    /// ISO 4217 code used for FOCUS billing records
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "vmcost".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            inventory_path: None,
            currency: default_currency(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    ///
    /// A value that fails to parse is an error; unset values take defaults.
    pub fn load() -> Result<Self> {
        Self::from_env(config::Environment::with_prefix("VMCOST"))
    }

    fn from_env(env: config::Environment) -> Result<Self> {
        config::Config::builder()
            .add_source(env)
            .build()
            .context("Failed to read VMCOST_* configuration")?
            .try_deserialize()
            .context("Invalid VMCOST_* configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.currency, "USD");
        assert!(config.inventory_path.is_none());
        assert!(!config.instance_name.is_empty());
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: ServerConfig = config::Config::builder()
            .set_override("api_port", 9090_i64)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.api_port, 9090);
        assert_eq!(config.currency, "USD");
    }

    fn vmcost_env(vars: &[(&str, &str)]) -> config::Environment {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("VMCOST").source(Some(source))
    }

    #[test]
    fn test_env_values_are_read() {
        let config = ServerConfig::from_env(vmcost_env(&[
            ("VMCOST_API_PORT", "9191"),
            ("VMCOST_INVENTORY_PATH", "/data/fleet.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_port, 9191);
        assert_eq!(config.inventory_path.as_deref(), Some("/data/fleet.json"));
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn test_unparseable_port_is_rejected() {
        let err = ServerConfig::from_env(vmcost_env(&[
            ("VMCOST_API_PORT", "notaport"),
            ("VMCOST_INVENTORY_PATH", "/data/fleet.json"),
        ]))
        .unwrap_err();

        assert!(format!("{:#}", err).contains("Invalid VMCOST_* configuration"));
    }
}
