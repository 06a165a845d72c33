//! Component data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Whether an installed component is currently usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentStatus::Active => write!(f, "active"),
            ComponentStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A registered component as persisted in the state store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Local alias, unique across the store
    pub name: String,

    /// Canonical `vendor/package` identifier
    pub package: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub commands: BTreeSet<String>,

    #[serde(default)]
    pub service_hooks: BTreeSet<String>,

    #[serde(default)]
    pub topics: BTreeSet<String>,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub star_count: u64,

    pub status: ComponentStatus,

    pub installed_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Component {
    pub fn is_active(&self) -> bool {
        self.status == ComponentStatus::Active
    }
}

/// Input to `register`: everything about a component the caller knows
///
/// The store owns `status` and the timestamps; `installed_at` here only
/// overrides the stored value when explicitly set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentRecord {
    pub package: String,
    pub description: String,
    pub version: Option<String>,
    pub commands: BTreeSet<String>,
    pub service_hooks: BTreeSet<String>,
    pub topics: BTreeSet<String>,
    pub url: String,
    pub star_count: u64,
    pub installed_at: Option<DateTime<Utc>>,
}

impl ComponentRecord {
    /// Create a record for a package with every other field empty
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Default::default()
        }
    }
}

/// Association between a hook identifier and the component owning it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHookRegistration {
    pub hook_id: String,
    pub component_name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A package found via remote discovery but not yet installed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredCandidate {
    /// Short repository name, used as the local alias
    pub name: String,

    /// Canonical `vendor/package` identifier required for installation
    pub full_name: String,

    pub description: String,
    pub url: String,
    pub topics: Vec<String>,
    pub updated_at: Option<String>,
    pub star_count: u64,
    pub language: String,
    pub license: String,
}

impl DiscoveredCandidate {
    /// Whether `query` names this candidate by alias or by full name
    pub fn matches(&self, query: &str) -> bool {
        self.name == query || self.full_name == query
    }

    /// Build the record registered after a successful install
    pub fn to_record(&self) -> ComponentRecord {
        ComponentRecord {
            package: self.full_name.clone(),
            description: self.description.clone(),
            topics: self.topics.iter().cloned().collect(),
            url: self.url.clone(),
            star_count: self.star_count,
            ..Default::default()
        }
    }
}

/// Counts reported by a legacy import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub components_migrated: usize,
    pub settings_migrated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> DiscoveredCandidate {
        DiscoveredCandidate {
            name: "widgets".to_string(),
            full_name: "acme/widgets".to_string(),
            description: "Widgets".to_string(),
            url: "https://github.com/acme/widgets".to_string(),
            topics: vec!["conduit-component".to_string(), "cli".to_string()],
            updated_at: None,
            star_count: 7,
            language: "PHP".to_string(),
            license: "MIT".to_string(),
        }
    }

    #[test]
    fn test_candidate_matches_alias_and_full_name() {
        let c = candidate();
        assert!(c.matches("widgets"));
        assert!(c.matches("acme/widgets"));
        assert!(!c.matches("acme"));
    }

    #[test]
    fn test_candidate_to_record() {
        let record = candidate().to_record();
        assert_eq!(record.package, "acme/widgets");
        assert_eq!(record.star_count, 7);
        assert!(record.topics.contains("conduit-component"));
        assert!(record.installed_at.is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ComponentStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(ComponentStatus::Inactive.to_string(), "inactive");
    }
}
