//! Type definitions for Conduit runtime configuration

mod runtime_config;

pub use runtime_config::*;
