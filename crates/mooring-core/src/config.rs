//! mooring.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level daemon configuration. Every section is optional; missing
/// sections fall back to the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MooringConfig {
    pub server: Option<ServerConfig>,
    pub store: Option<StoreConfig>,
    pub cluster: Option<ClusterConfig>,
    pub policy: Option<PolicyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. "0.0.0.0:8080".
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file path.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Orchestrator API base URL, e.g. "https://kube.internal:6443".
    pub base_url: Option<String>,
    /// Bearer token for the orchestrator API.
    pub token: Option<String>,
    /// When true, reconcile against an in-memory cluster instead of the
    /// real orchestrator.
    pub dry_run: Option<bool>,
}

/// Overrides for the manifest translation policy constants. Absent
/// fields keep the compiled-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub workload_request_ratio: Option<f64>,
    pub middleware_request_ratio: Option<f64>,
    pub ingress_class: Option<String>,
    pub storage_provisioner: Option<String>,
}

impl MooringConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MooringConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn listen(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.listen.clone())
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
    }

    pub fn store_path(&self) -> String {
        self.store
            .as_ref()
            .and_then(|s| s.path.clone())
            .unwrap_or_else(|| "mooring.db".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal() {
        let config: MooringConfig = toml::from_str("").unwrap();
        assert_eq!(config.listen(), "0.0.0.0:8080");
        assert_eq!(config.store_path(), "mooring.db");
    }

    #[test]
    fn parse_full() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:9090"

[store]
path = "/var/lib/mooring/mooring.db"

[cluster]
base_url = "https://kube.internal:6443"
token = "secret"
dry_run = false

[policy]
workload_request_ratio = 0.5
ingress_class = "traefik"
"#;
        let config: MooringConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.listen(), "127.0.0.1:9090");
        assert_eq!(
            config.cluster.as_ref().unwrap().base_url.as_deref(),
            Some("https://kube.internal:6443")
        );
        let policy = config.policy.unwrap();
        assert_eq!(policy.workload_request_ratio, Some(0.5));
        assert_eq!(policy.ingress_class.as_deref(), Some("traefik"));
        assert!(policy.middleware_request_ratio.is_none());
    }
}
