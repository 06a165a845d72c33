//! Read-only adapter for the previous static configuration format
//!
//! Older releases kept installed components and settings in a YAML file that
//! the CLI rewrote in place. That file is only ever read here, as the source
//! of a one-way import into the JSON store.

use crate::error::{Error, Result};
use crate::types::{Component, ComponentStatus};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Parsed legacy configuration
#[derive(Debug, Default, Deserialize)]
pub struct LegacyConfig {
    #[serde(default)]
    pub installed: BTreeMap<String, LegacyComponent>,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
}

/// Component entry as the legacy format stored it
#[derive(Debug, Default, Deserialize)]
pub struct LegacyComponent {
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub env_vars: Vec<String>,
    #[serde(default)]
    pub service_providers: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub stars: Option<u64>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub installed_at: Option<String>,
}

impl LegacyConfig {
    /// Load the legacy file; `None` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Some(Self::default()));
        }

        let config = serde_yaml_ng::from_str(&content).map_err(|e| {
            Error::Config(conduit_core::Error::invalid_config(format!(
                "Failed to parse legacy configuration {}: {}",
                path.display(),
                e
            )))
        })?;
        Ok(Some(config))
    }
}

impl LegacyComponent {
    /// Convert to a stored component, keeping timestamps of an existing entry
    ///
    /// Returns `None` for entries without a package, which the store rejects.
    pub fn into_component(self, name: &str, existing: Option<&Component>) -> Option<Component> {
        if self.package.trim().is_empty() {
            return None;
        }

        if !self.env_vars.is_empty() {
            debug!(
                "Legacy component {} declared environment variables, which are not imported",
                name
            );
        }

        let installed_at = self
            .installed_at
            .as_deref()
            .and_then(parse_legacy_timestamp)
            .or(existing.map(|c| c.installed_at))
            .unwrap_or_else(Utc::now);

        let status = match self.status.as_deref() {
            Some("inactive") | Some("disabled") => ComponentStatus::Inactive,
            _ => ComponentStatus::Active,
        };

        Some(Component {
            name: name.to_string(),
            package: self.package,
            description: self.description.unwrap_or_default(),
            version: self.version,
            commands: self.commands.into_iter().collect(),
            service_hooks: self.service_providers.into_iter().collect::<BTreeSet<_>>(),
            topics: self.topics.into_iter().collect(),
            url: self.url.unwrap_or_default(),
            star_count: self.stars.unwrap_or(0),
            status,
            installed_at,
            updated_at: existing.and_then(|c| c.updated_at),
        })
    }
}

fn parse_legacy_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(LegacyConfig::load(&temp.path().join("absent.yaml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_legacy_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("components.yaml");
        fs::write(
            &path,
            r#"
installed:
  github:
    package: jordanpartridge/github-zero
    description: GitHub integration
    commands: ["github:repos", "github:clone"]
    service_providers: ['JordanPartridge\GithubZero\GithubZeroServiceProvider']
    stars: 12
    status: active
    installed_at: "2024-03-01 10:30:00"
settings:
  interactive_mode: false
  theme: { color: blue }
"#,
        )
        .unwrap();

        let legacy = LegacyConfig::load(&path).unwrap().unwrap();
        assert_eq!(legacy.settings["interactive_mode"], serde_json::json!(false));
        assert_eq!(legacy.settings["theme"]["color"], serde_json::json!("blue"));

        let component = legacy
            .installed
            .into_iter()
            .next()
            .map(|(name, c)| c.into_component(&name, None).unwrap())
            .unwrap();
        assert_eq!(component.name, "github");
        assert_eq!(component.star_count, 12);
        assert_eq!(component.commands.len(), 2);
        assert_eq!(
            component.installed_at.to_rfc3339(),
            "2024-03-01T10:30:00+00:00"
        );
        assert!(component
            .service_hooks
            .contains("JordanPartridge\\GithubZero\\GithubZeroServiceProvider"));
    }

    #[test]
    fn test_component_without_package_is_skipped() {
        let legacy = LegacyComponent::default();
        assert!(legacy.into_component("x", None).is_none());
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("components.yaml");
        fs::write(&path, "installed: [unclosed").unwrap();
        assert!(matches!(LegacyConfig::load(&path), Err(Error::Config(_))));
    }
}
