use std::path::Path;

use serde::{Deserialize, Serialize};

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8333
}
fn default_api_port() -> u16 {
    8080
}
fn default_api_enabled() -> bool {
    true
}

/// Node configuration, loaded from an optional TOML file layered under
/// `VESPER__*` environment overrides. Field names and defaults match the
/// external configuration document the process supervisor hands the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub validator_address: Option<String>,
    #[serde(default)]
    pub initial_peers: Vec<String>,
    #[serde(default)]
    pub mining_enabled: bool,
    #[serde(default = "default_api_enabled")]
    pub api_enabled: bool,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            validator_address: None,
            initial_peers: Vec::new(),
            mining_enabled: false,
            api_enabled: default_api_enabled(),
            api_port: default_api_port(),
        }
    }
}

impl NodeConfig {
    /// Loads defaults, then an optional TOML file at `path` if it exists,
    /// then `VESPER__*` environment variables (double underscore nesting,
    /// e.g. `VESPER__PORT=9000`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&NodeConfig::default())?);
        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            }
        }
        builder = builder.add_source(config::Environment::with_prefix("VESPER").separator("__"));
        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_external_contract() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8333);
        assert_eq!(cfg.api_port, 8080);
        assert!(cfg.api_enabled);
        assert!(!cfg.mining_enabled);
        assert!(cfg.validator_address.is_none());
    }

    #[test]
    fn load_with_missing_file_falls_back_to_defaults() {
        let cfg = NodeConfig::load(Some(Path::new("/nonexistent/vesper.toml"))).unwrap();
        assert_eq!(cfg.port, 8333);
    }
}
