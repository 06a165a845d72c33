//! # conduit-core
//!
//! Core library for the Conduit CLI providing:
//! - Runtime configuration types (network, discovery, provenance, package manager, storage)
//! - Hierarchical configuration loading with embedded defaults
//! - Shared error type and utilities

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::RuntimeConfig;
pub use utils::{conduit_home, get_home_dir};
