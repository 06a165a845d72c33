//! Package name validation
//!
//! Every identifier derived from user or remote input passes through here
//! before it reaches a subprocess argument or a filesystem path.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Maximum accepted package name length (inclusive)
pub const MAX_PACKAGE_NAME_LEN: usize = 100;

static PACKAGE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([_.-]?[a-z0-9]+)*/[a-z0-9]([_.-]?[a-z0-9]+)*$")
        .expect("package name pattern is valid")
});

/// Validate a `vendor/package` identifier
pub fn validate_package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name("package name is empty", name));
    }

    if name.len() > MAX_PACKAGE_NAME_LEN {
        return Err(Error::invalid_name(
            format!(
                "package name is too long ({} characters, maximum {})",
                name.len(),
                MAX_PACKAGE_NAME_LEN
            ),
            name,
        ));
    }

    if !PACKAGE_NAME_RE.is_match(name) {
        return Err(Error::invalid_name(
            "expected lowercase 'vendor/package' using only a-z, 0-9 and single '.', '_' or '-' separators",
            name,
        ));
    }

    Ok(())
}

/// Predicate form of [`validate_package_name`]
pub fn is_valid_package_name(name: &str) -> bool {
    validate_package_name(name).is_ok()
}
