//! Command implementations

pub mod components;
pub mod settings;
pub mod storage;
pub mod version;

use anyhow::{Context, Result};
use conduit_components::ComponentManager;
use conduit_core::HierarchicalConfigLoader;

/// Load configuration and wire the component manager
pub(crate) fn load_manager() -> Result<ComponentManager> {
    let loader = HierarchicalConfigLoader::new().context("Failed to locate configuration directory")?;
    let config = loader
        .load_runtime_config()
        .context("Failed to load runtime configuration")?;
    let manager = ComponentManager::from_config(&config, &loader)?;
    Ok(manager)
}
