//! Persistent component state
//!
//! A single JSON document (`~/.conduit/conduit.json` by default) holds
//! installed components, global settings and service hook registrations.
//!
//! Every mutation runs under an in-process mutex and an exclusive file lock,
//! snapshots the document to a timestamped backup, applies the change to an
//! in-memory copy, validates it, then writes through a temp file and rename.
//! On any failure the backup is moved back into place before the error is
//! returned, so the document is always either fully old or fully new.

use crate::error::{Error, Result};
use crate::legacy::LegacyConfig;
use crate::types::{
    Component, ComponentRecord, ComponentStatus, MigrationReport, ServiceHookRegistration,
};
use chrono::{DateTime, Utc};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

pub const SCHEMA_VERSION: &str = "1.0";

const REQUIRED_SECTIONS: &[&str] = &["installed", "settings", "service_hooks", "_meta"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DocumentMeta {
    schema_version: String,
    last_modified: DateTime<Utc>,
    #[serde(default = "default_generated_by")]
    generated_by: String,
}

fn default_generated_by() -> String {
    "conduit".to_string()
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            last_modified: Utc::now(),
            generated_by: default_generated_by(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StateDocument {
    installed: BTreeMap<String, Component>,
    settings: BTreeMap<String, Value>,
    service_hooks: Vec<ServiceHookRegistration>,
    #[serde(rename = "_meta")]
    meta: DocumentMeta,
}

impl StateDocument {
    fn validate(&self) -> Result<()> {
        for (key, component) in &self.installed {
            if key.trim().is_empty() {
                return Err(Error::store_validation("component name is empty"));
            }
            if component.name != *key {
                return Err(Error::store_validation(format!(
                    "component stored under '{}' is named '{}'",
                    key, component.name
                )));
            }
            if component.package.trim().is_empty() {
                return Err(Error::store_validation(format!(
                    "component '{}' has no package",
                    key
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for hook in &self.service_hooks {
            if hook.hook_id.trim().is_empty() {
                return Err(Error::store_validation(format!(
                    "service hook for '{}' has an empty identifier",
                    hook.component_name
                )));
            }
            if !self.installed.contains_key(&hook.component_name) {
                return Err(Error::store_validation(format!(
                    "service hook '{}' references unknown component '{}'",
                    hook.hook_id, hook.component_name
                )));
            }
            if !seen.insert((&hook.hook_id, &hook.component_name)) {
                return Err(Error::store_validation(format!(
                    "duplicate service hook '{}' for '{}'",
                    hook.hook_id, hook.component_name
                )));
            }
        }

        Ok(())
    }

    fn replace_hooks(&mut self, name: &str, hooks: &BTreeSet<String>) {
        self.service_hooks.retain(|h| h.component_name != name);
        self.service_hooks
            .extend(hooks.iter().map(|hook_id| ServiceHookRegistration {
                hook_id: hook_id.clone(),
                component_name: name.to_string(),
                enabled: true,
            }));
    }
}

/// JSON document backed component state store
pub struct ComponentStore {
    path: PathBuf,
    legacy_path: PathBuf,
    write_guard: Mutex<()>,
}

impl ComponentStore {
    /// Create a store over `path`, importing legacy data from `legacy_path` on request
    pub fn new(path: impl Into<PathBuf>, legacy_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            legacy_path: legacy_path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn legacy_path(&self) -> &Path {
        &self.legacy_path
    }

    pub fn is_initialized(&self) -> bool {
        self.path.is_file()
    }

    /// Create the backing document and its parent directories if absent
    ///
    /// Returns true when a new document was created.
    pub fn initialize_if_needed(&self) -> Result<bool> {
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if self.is_initialized() {
            debug!("Component store already initialized at {}", self.path.display());
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.write_document(&StateDocument::default())?;
        info!("Initialized component store at {}", self.path.display());
        Ok(true)
    }

    pub fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self.load()?.installed.contains_key(name))
    }

    pub fn get_installed(&self) -> Result<BTreeMap<String, Component>> {
        Ok(self.load()?.installed)
    }

    pub fn get_component(&self, name: &str) -> Result<Option<Component>> {
        Ok(self.load()?.installed.remove(name))
    }

    /// Upsert a component as active and replace its service hooks
    ///
    /// An existing `installed_at` survives re-registration unless the record
    /// sets one; re-registration stamps `updated_at`.
    pub fn register(&self, name: &str, record: ComponentRecord) -> Result<Component> {
        self.mutate(|doc| {
            let now = Utc::now();
            let existing = doc.installed.get(name);
            let installed_at = record
                .installed_at
                .or(existing.map(|c| c.installed_at))
                .unwrap_or(now);
            let updated_at = existing.map(|_| now);

            let component = Component {
                name: name.to_string(),
                package: record.package,
                description: record.description,
                version: record.version,
                commands: record.commands,
                service_hooks: record.service_hooks,
                topics: record.topics,
                url: record.url,
                star_count: record.star_count,
                status: ComponentStatus::Active,
                installed_at,
                updated_at,
            };

            doc.replace_hooks(name, &component.service_hooks);
            doc.installed.insert(name.to_string(), component.clone());
            Ok(component)
        })
        .inspect(|_| info!("Registered component {}", name))
    }

    /// Remove a component and its service hooks; absent names are a no-op
    pub fn unregister(&self, name: &str) -> Result<bool> {
        let removed = self.mutate(|doc| {
            if doc.installed.remove(name).is_none() {
                return Ok(false);
            }
            doc.service_hooks.retain(|h| h.component_name != name);
            Ok(true)
        })?;

        if removed {
            info!("Unregistered component {}", name);
        } else {
            debug!("Component {} not registered, nothing to remove", name);
        }
        Ok(removed)
    }

    pub fn set_status(&self, name: &str, status: ComponentStatus) -> Result<()> {
        self.mutate(|doc| {
            let component = doc
                .installed
                .get_mut(name)
                .ok_or_else(|| Error::not_installed(name))?;
            component.status = status;
            component.updated_at = Some(Utc::now());
            Ok(())
        })
    }

    pub fn get_hooks(&self, name: &str) -> Result<Vec<ServiceHookRegistration>> {
        Ok(self
            .load()?
            .service_hooks
            .into_iter()
            .filter(|h| h.component_name == name)
            .collect())
    }

    pub fn get_all_hooks(&self) -> Result<Vec<ServiceHookRegistration>> {
        Ok(self.load()?.service_hooks)
    }

    /// Read a setting, falling back to `default` when the key is absent
    pub fn get_setting(&self, key: &str, default: Value) -> Result<Value> {
        Ok(self.load()?.settings.remove(key).unwrap_or(default))
    }

    pub fn set_setting(&self, key: &str, value: Value) -> Result<()> {
        self.mutate(|doc| {
            doc.settings.insert(key.to_string(), value);
            Ok(())
        })
    }

    pub fn get_all_settings(&self) -> Result<BTreeMap<String, Value>> {
        Ok(self.load()?.settings)
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        if !self.load()?.settings.contains_key(key) {
            return Ok(false);
        }
        self.mutate(|doc| Ok(doc.settings.remove(key).is_some()))
    }

    /// Import components and settings from the previous static config file
    ///
    /// Upsert based and safe to repeat. A missing legacy file yields zero counts.
    pub fn migrate_from_legacy_format(&self) -> Result<MigrationReport> {
        if !self.is_initialized() {
            return Err(Error::store_uninitialized(&self.path));
        }

        let Some(legacy) = LegacyConfig::load(&self.legacy_path)? else {
            debug!("No legacy configuration at {}", self.legacy_path.display());
            return Ok(MigrationReport::default());
        };

        let report = self.mutate(|doc| {
            let mut report = MigrationReport::default();

            for (name, legacy_component) in legacy.installed {
                let existing = doc.installed.get(&name);
                let Some(component) = legacy_component.into_component(&name, existing) else {
                    warn!("Skipping legacy component {} without a package", name);
                    continue;
                };
                doc.replace_hooks(&name, &component.service_hooks);
                doc.installed.insert(name, component);
                report.components_migrated += 1;
            }

            for (key, value) in legacy.settings {
                doc.settings.insert(key, value);
                report.settings_migrated += 1;
            }

            Ok(report)
        })?;

        info!(
            "Migrated {} components and {} settings from {}",
            report.components_migrated,
            report.settings_migrated,
            self.legacy_path.display()
        );
        Ok(report)
    }

    fn load(&self) -> Result<StateDocument> {
        if !self.is_initialized() {
            return Err(Error::store_uninitialized(&self.path));
        }

        let content = fs::read_to_string(&self.path)?;
        let raw: Value = serde_json::from_str(&content)?;
        let sections = raw
            .as_object()
            .ok_or_else(|| Error::store_validation("state document is not a JSON object"))?;
        for section in REQUIRED_SECTIONS {
            if !sections.contains_key(*section) {
                return Err(Error::store_validation(format!(
                    "state document is missing the '{}' section",
                    section
                )));
            }
        }

        Ok(serde_json::from_value(raw)?)
    }

    fn mutate<T>(&self, apply: impl FnOnce(&mut StateDocument) -> Result<T>) -> Result<T> {
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !self.is_initialized() {
            return Err(Error::store_uninitialized(&self.path));
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.sibling(".lock"))?;
        lock_file.lock_exclusive()?;

        let backup = self.sibling(&format!(".backup.{}", Utc::now().format("%Y%m%d%H%M%S%f")));
        fs::copy(&self.path, &backup)?;

        let result = self.load().and_then(|mut doc| {
            let before = doc.clone();
            let value = apply(&mut doc)?;
            if doc == before {
                return Ok(value);
            }
            doc.meta.last_modified = Utc::now();
            doc.validate()?;
            self.write_document(&doc)?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                if let Err(e) = fs::remove_file(&backup) {
                    warn!("Failed to remove backup {}: {}", backup.display(), e);
                }
                Ok(value)
            }
            Err(e) => {
                warn!("Store update failed, restoring backup: {}", e);
                if let Err(restore_err) = fs::rename(&backup, &self.path) {
                    warn!(
                        "Failed to restore {} from {}: {}",
                        self.path.display(),
                        backup.display(),
                        restore_err
                    );
                }
                Err(e)
            }
        }
    }

    fn write_document(&self, doc: &StateDocument) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp, doc)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }
}
