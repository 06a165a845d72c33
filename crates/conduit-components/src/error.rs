//! Error types for conduit-components

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using conduit-components's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Component lifecycle error types
#[derive(Error, Debug)]
pub enum Error {
    /// Package identifier failed the `vendor/package` grammar or length check
    #[error("Invalid package name '{input}': {reason}")]
    InvalidName { reason: String, input: String },

    /// Package index has no such package
    #[error("Package '{package}' was not found on the package index")]
    NotFound { package: String },

    /// Package exists but carries neither the marker keyword nor the marker topic
    #[error(
        "Package '{package}' exists but is not a Conduit component (missing '{marker}' keyword or topic)"
    )]
    MissingMarker { package: String, marker: String },

    /// Transport-level failure while verifying provenance
    #[error("Could not verify package '{package}': {message}")]
    VerificationFailed { package: String, message: String },

    /// Package manager exited non-zero or timed out
    #[error("Package manager failed for '{package}': {stderr}")]
    ProcessFailure { package: String, stderr: String },

    /// Store accessed before bootstrap
    #[error("Component storage is not initialized at {}. Run: conduit storage init", path.display())]
    StoreUninitialized { path: PathBuf },

    /// Store document failed structural validation
    #[error("Component storage validation failed: {message}")]
    StoreValidation { message: String },

    /// Uninstall requested for a component the store does not track
    #[error("Component '{name}' is not installed. Run: conduit components list")]
    NotInstalled { name: String },

    /// Install requested for a component that is already active
    #[error("Component '{name}' is already installed")]
    AlreadyInstalled { name: String },

    /// No discovered candidate matches the requested name
    #[error("Component '{name}' was not found among discovered components. Run: conduit components discover")]
    ComponentNotFound { name: String },

    /// Another lifecycle transition for the same name is in flight
    #[error("Another operation on component '{name}' is already in progress")]
    OperationInProgress { name: String },

    /// Configuration error
    #[error(transparent)]
    Config(#[from] conduit_core::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid name error
    pub fn invalid_name(reason: impl Into<String>, input: impl Into<String>) -> Self {
        Self::InvalidName {
            reason: reason.into(),
            input: input.into(),
        }
    }

    /// Create a package not found error
    pub fn not_found(package: impl Into<String>) -> Self {
        Self::NotFound {
            package: package.into(),
        }
    }

    /// Create a missing marker error
    pub fn missing_marker(package: impl Into<String>, marker: impl Into<String>) -> Self {
        Self::MissingMarker {
            package: package.into(),
            marker: marker.into(),
        }
    }

    /// Create a verification failed error
    pub fn verification_failed(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VerificationFailed {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Create a process failure error
    pub fn process_failure(package: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::ProcessFailure {
            package: package.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a store uninitialized error
    pub fn store_uninitialized(path: impl Into<PathBuf>) -> Self {
        Self::StoreUninitialized { path: path.into() }
    }

    /// Create a store validation error
    pub fn store_validation(message: impl Into<String>) -> Self {
        Self::StoreValidation {
            message: message.into(),
        }
    }

    /// Create a not installed error
    pub fn not_installed(name: impl Into<String>) -> Self {
        Self::NotInstalled { name: name.into() }
    }

    /// Create an already installed error
    pub fn already_installed(name: impl Into<String>) -> Self {
        Self::AlreadyInstalled { name: name.into() }
    }

    /// Create a component not found error
    pub fn component_not_found(name: impl Into<String>) -> Self {
        Self::ComponentNotFound { name: name.into() }
    }

    /// Create an operation in progress error
    pub fn operation_in_progress(name: impl Into<String>) -> Self {
        Self::OperationInProgress { name: name.into() }
    }

    /// Whether this error came from the provenance trust boundary
    pub fn is_provenance_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::MissingMarker { .. } | Self::VerificationFailed { .. }
        )
    }
}
