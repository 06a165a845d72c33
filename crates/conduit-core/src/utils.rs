//! Shared utility functions for Conduit crates

use anyhow::anyhow;
use std::path::PathBuf;

/// Name of the per-user state directory under the home directory
pub const CONDUIT_DIR_NAME: &str = ".conduit";

/// Get the user's home directory
///
/// Prefers the HOME environment variable over `dirs::home_dir()` so that
/// overriding HOME (tests, containers) relocates all Conduit state.
pub fn get_home_dir() -> anyhow::Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }

    dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// Get the Conduit state directory (~/.conduit)
pub fn conduit_home() -> anyhow::Result<PathBuf> {
    Ok(get_home_dir()?.join(CONDUIT_DIR_NAME))
}
