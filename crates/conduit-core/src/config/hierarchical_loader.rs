//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Runtime config (~/.conduit/conduit-runtime.yaml)
//! 3. Environment variables (CONDUIT_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::RuntimeConfig;
use crate::utils::conduit_home;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const RUNTIME_CONFIG_FILE: &str = "conduit-runtime.yaml";
const STATE_FILE: &str = "conduit.json";
const LEGACY_CONFIG_FILE: &str = "components.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader rooted at ~/.conduit
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    fn get_config_dir() -> Result<Utf8PathBuf> {
        let dir = conduit_home().map_err(|e| Error::invalid_config(e.to_string()))?;
        Utf8PathBuf::from_path_buf(dir).map_err(|p| {
            Error::invalid_config(format!("Home directory is not valid UTF-8: {}", p.display()))
        })
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>("runtime-defaults.yaml")?;

        let runtime_config_path = self.config_dir.join(RUNTIME_CONFIG_FILE);
        if runtime_config_path.exists() {
            let file_config = self.load_yaml_file::<RuntimeConfig>(&runtime_config_path)?;
            config = Self::merge_runtime_config(config, file_config);
        }

        config = self.apply_env_overrides(config)?;
        Self::validate_runtime_config(&config)?;

        Ok(config)
    }

    /// Reject timeout combinations that would let a network call outlive the install
    fn validate_runtime_config(config: &RuntimeConfig) -> Result<()> {
        let http = config.network.http_timeout_secs;
        let install = config.package_manager.timeout_secs;

        if http == 0 || install == 0 {
            return Err(Error::invalid_config(
                "network.http-timeout-secs and package-manager.timeout-secs must be greater than zero",
            ));
        }
        if http >= install {
            return Err(Error::invalid_config(format!(
                "network.http-timeout-secs ({}s) must be shorter than package-manager.timeout-secs ({}s)",
                http, install
            )));
        }
        Ok(())
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        let config: T = serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })?;

        Ok(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let config: T = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(config)
    }

    /// Merge two runtime configs (base is overridden by overlay)
    ///
    /// Sections missing from the overlay file deserialize to their defaults,
    /// so the overlay wins section by section. Storage paths only replace the
    /// base when the overlay sets them.
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            network: overlay.network,
            discovery: overlay.discovery,
            provenance: overlay.provenance,
            package_manager: crate::types::PackageManagerConfig {
                working_dir: overlay
                    .package_manager
                    .working_dir
                    .clone()
                    .or(base.package_manager.working_dir),
                ..overlay.package_manager
            },
            storage: crate::types::StorageConfig {
                state_file: overlay.storage.state_file.or(base.storage.state_file),
                legacy_config_file: overlay
                    .storage
                    .legacy_config_file
                    .or(base.storage.legacy_config_file),
            },
        }
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("CONDUIT_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("CONDUIT_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("CONDUIT_INSTALL_TIMEOUT_SECS") {
            config.package_manager.timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("CONDUIT_INSTALL_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("CONDUIT_MARKER_TOPIC") {
            if !val.trim().is_empty() {
                config.discovery.marker_topic = val;
            }
        }

        if let Ok(val) = env::var("CONDUIT_GITHUB_API_URL") {
            config.discovery.api_url = val.clone();
            config.provenance.github_api_url = val;
        }

        if let Ok(val) = env::var("CONDUIT_INDEX_URL") {
            config.provenance.index_url = val;
        }

        if let Ok(val) = env::var("CONDUIT_STATE_FILE") {
            config.storage.state_file = Some(PathBuf::from(val));
        }

        if let Ok(val) = env::var("CONDUIT_WORKING_DIR") {
            config.package_manager.working_dir = Some(PathBuf::from(val));
        }

        Ok(config)
    }

    /// Resolve the JSON state document path for a loaded config
    pub fn state_file_path(&self, config: &RuntimeConfig) -> PathBuf {
        config
            .storage
            .state_file
            .clone()
            .unwrap_or_else(|| self.config_dir.join(STATE_FILE).into_std_path_buf())
    }

    /// Resolve the legacy static configuration path for a loaded config
    pub fn legacy_config_path(&self, config: &RuntimeConfig) -> PathBuf {
        config
            .storage
            .legacy_config_file
            .clone()
            .unwrap_or_else(|| self.config_dir.join(LEGACY_CONFIG_FILE).into_std_path_buf())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
