//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls runtime behavior like
//! network timeouts, the discovery marker, the package index, the external
//! package manager invocation and where component state lives.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Remote discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Provenance verification endpoints
    #[serde(default)]
    pub provenance: ProvenanceConfig,

    /// External package manager invocation
    #[serde(default)]
    pub package_manager: PackageManagerConfig,

    /// Component state storage locations
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// HTTP timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!(
        "conduit/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Remote discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Topic that marks a repository as a Conduit component
    #[serde(default = "default_marker_topic")]
    pub marker_topic: String,

    /// Number of search results requested per query (clamped to 1..=100)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Base URL of the GitHub-compatible search API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Use the local registry when remote discovery yields nothing
    #[serde(default)]
    pub fallback_to_local: bool,

    /// Read-only list of known components
    #[serde(default)]
    pub local_registry: Vec<LocalRegistryEntry>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            marker_topic: default_marker_topic(),
            per_page: default_per_page(),
            api_url: default_github_api_url(),
            fallback_to_local: false,
            local_registry: Vec::new(),
        }
    }
}

fn default_marker_topic() -> String {
    "conduit-component".to_string()
}

fn default_per_page() -> u32 {
    50
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

/// A component known ahead of time, used when remote discovery is unavailable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocalRegistryEntry {
    /// Local alias
    pub name: String,

    /// Canonical `vendor/package` identifier
    pub full_name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,
}

/// Provenance verification endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProvenanceConfig {
    /// Base URL of the package index (Packagist-compatible)
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Base URL of the GitHub API used for the topic fallback
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            github_api_url: default_github_api_url(),
        }
    }
}

fn default_index_url() -> String {
    "https://packagist.org".to_string()
}

/// External package manager invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageManagerConfig {
    /// Program name or path
    #[serde(default = "default_program")]
    pub program: String,

    /// Sub-command adding a dependency
    #[serde(default = "default_add_command")]
    pub add_command: String,

    /// Flags appended after the package name on add
    #[serde(default = "default_add_flags")]
    pub add_flags: Vec<String>,

    /// Sub-command removing a dependency
    #[serde(default = "default_remove_command")]
    pub remove_command: String,

    /// Flags appended after the package name on remove
    #[serde(default = "default_remove_flags")]
    pub remove_flags: Vec<String>,

    /// Subprocess timeout in seconds
    #[serde(default = "default_install_timeout")]
    pub timeout_secs: u64,

    /// Application root the package manager runs in (current directory when unset)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for PackageManagerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            add_command: default_add_command(),
            add_flags: default_add_flags(),
            remove_command: default_remove_command(),
            remove_flags: default_remove_flags(),
            timeout_secs: default_install_timeout(),
            working_dir: None,
        }
    }
}

fn default_program() -> String {
    "composer".to_string()
}

fn default_add_command() -> String {
    "require".to_string()
}

fn default_add_flags() -> Vec<String> {
    vec![
        "--no-interaction".to_string(),
        "--no-progress".to_string(),
        "--prefer-dist".to_string(),
    ]
}

fn default_remove_command() -> String {
    "remove".to_string()
}

fn default_remove_flags() -> Vec<String> {
    vec!["--no-interaction".to_string(), "--no-progress".to_string()]
}

fn default_install_timeout() -> u64 {
    300
}

/// Component state storage locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// JSON state document (~/.conduit/conduit.json when unset)
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    /// Static configuration of the previous generation (~/.conduit/components.yaml when unset)
    #[serde(default)]
    pub legacy_config_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_config_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.network.http_timeout_secs, 20);
        assert!(config.network.user_agent.starts_with("conduit/"));
        assert_eq!(config.discovery.marker_topic, "conduit-component");
        assert_eq!(config.discovery.per_page, 50);
        assert_eq!(config.package_manager.program, "composer");
        assert_eq!(config.package_manager.timeout_secs, 300);
        assert!(config.storage.state_file.is_none());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
package-manager:
  timeout-secs: 60
discovery:
  fallback-to-local: true
  local-registry:
    - name: widgets
      full-name: acme/widgets
"#;
        let config: RuntimeConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.package_manager.timeout_secs, 60);
        assert_eq!(config.package_manager.add_command, "require");
        assert_eq!(
            config.package_manager.add_flags,
            vec!["--no-interaction", "--no-progress", "--prefer-dist"]
        );
        assert!(config.discovery.fallback_to_local);
        assert_eq!(config.discovery.local_registry.len(), 1);
        assert_eq!(config.discovery.local_registry[0].full_name, "acme/widgets");
        assert!(config.discovery.local_registry[0].topics.is_empty());
        assert_eq!(config.network.http_timeout_secs, 20);
    }
}
