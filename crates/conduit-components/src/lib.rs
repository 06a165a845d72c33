//! Component lifecycle management for Conduit
//!
//! This crate provides:
//! - Package name validation guarding every subprocess argument and vendor path
//! - Remote discovery of marker-tagged repositories
//! - Provenance verification against the package index and repository topics
//! - Secure install/remove through the external package manager
//! - Best-effort detection of service hooks and commands
//! - A crash-safe JSON state store with legacy import
//! - The lifecycle orchestrator tying these together

pub mod detector;
pub mod discovery;
pub mod error;
pub mod installer;
pub mod legacy;
pub mod manager;
pub mod runner;
pub mod store;
pub mod types;
pub mod validation;
pub mod verifier;

pub use detector::{HookDetector, ManifestScanDetector};
pub use discovery::{ComponentSource, GitHubDiscovery};
pub use error::{Error, Result};
pub use installer::{PackageManagerCommand, SecureInstaller};
pub use manager::{
    AutoConfirm, ComponentManager, ComponentState, InstallOutcome, Prompt, StorageInit,
    UninstallOutcome, INTERACTIVE_MODE_SETTING,
};
pub use runner::{failure_hint, CommandRunner, ProcessOutcome, ProcessRunner};
pub use store::ComponentStore;
pub use types::{
    Component, ComponentRecord, ComponentStatus, DiscoveredCandidate, MigrationReport,
    ServiceHookRegistration,
};
pub use validation::{is_valid_package_name, validate_package_name};
pub use verifier::{PackagistVerifier, ProvenanceCheck};
