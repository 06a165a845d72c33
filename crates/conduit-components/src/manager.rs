//! Component lifecycle orchestration
//!
//! Drives discovery, installation, hook detection and registration, and the
//! reverse path for removal. The state store is queried fresh on every call.
//!
//! Per component the lifecycle is
//! `Unknown -> Discovered -> Installing -> Active -> Removing -> Unknown`,
//! and at most one transition per component may be in flight. Flights are
//! keyed on the resolved package identifier, so a local name and its
//! `vendor/package` alias contend for the same slot.

use crate::detector::{HookDetector, ManifestScanDetector};
use crate::discovery::{ComponentSource, GitHubDiscovery};
use crate::error::{Error, Result};
use crate::installer::{PackageManagerCommand, SecureInstaller};
use crate::runner::CommandRunner;
use crate::store::ComponentStore;
use crate::types::{Component, ComponentStatus, DiscoveredCandidate, MigrationReport};
use crate::verifier::PackagistVerifier;
use conduit_core::types::{DiscoveryConfig, LocalRegistryEntry};
use conduit_core::{HierarchicalConfigLoader, RuntimeConfig};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Setting key controlling interactive confirmation
pub const INTERACTIVE_MODE_SETTING: &str = "interactive_mode";

/// Lifecycle state of a component name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Unknown,
    Discovered,
    Installing,
    Active,
    Removing,
}

impl std::fmt::Display for ComponentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ComponentState::Unknown => "unknown",
            ComponentState::Discovered => "discovered",
            ComponentState::Installing => "installing",
            ComponentState::Active => "active",
            ComponentState::Removing => "removing",
        };
        write!(f, "{}", s)
    }
}

/// Confirmation capability injected by the presentation layer
pub trait Prompt: Send + Sync {
    fn confirm_install(&self, candidate: &DiscoveredCandidate) -> bool;
    fn confirm_uninstall(&self, component: &Component) -> bool;
}

/// Prompt that approves everything, for non-interactive use
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Prompt for AutoConfirm {
    fn confirm_install(&self, _candidate: &DiscoveredCandidate) -> bool {
        true
    }

    fn confirm_uninstall(&self, _component: &Component) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstallOutcome {
    Installed(Component),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UninstallOutcome {
    Removed(Component),
    Cancelled,
}

/// Result of preparing component storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageInit {
    pub created: bool,
    pub migration: Option<MigrationReport>,
}

/// A transition currently running for one package
#[derive(Debug, Clone)]
struct Flight {
    name: String,
    state: ComponentState,
}

type FlightMap = Mutex<HashMap<String, Flight>>;

/// Releases a package's in-flight slot on drop
struct FlightGuard<'a> {
    in_flight: &'a FlightMap,
    package: String,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut map = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.remove(&self.package);
    }
}

impl From<&LocalRegistryEntry> for DiscoveredCandidate {
    fn from(entry: &LocalRegistryEntry) -> Self {
        Self {
            name: entry.name.clone(),
            full_name: entry.full_name.clone(),
            description: entry
                .description
                .clone()
                .unwrap_or_else(|| "No description available".to_string()),
            url: entry.url.clone().unwrap_or_default(),
            topics: entry.topics.clone(),
            updated_at: None,
            star_count: 0,
            language: "Unknown".to_string(),
            license: "No license".to_string(),
        }
    }
}

/// Top-level facade over discovery, installation, detection and state
pub struct ComponentManager {
    store: Arc<ComponentStore>,
    source: Arc<dyn ComponentSource>,
    installer: SecureInstaller,
    detector: Arc<dyn HookDetector>,
    prompt: Arc<dyn Prompt>,
    discovery: DiscoveryConfig,
    in_flight: FlightMap,
    last_discovered: Mutex<BTreeSet<String>>,
}

impl ComponentManager {
    pub fn new(
        store: Arc<ComponentStore>,
        source: Arc<dyn ComponentSource>,
        installer: SecureInstaller,
        detector: Arc<dyn HookDetector>,
        discovery: DiscoveryConfig,
    ) -> Self {
        Self {
            store,
            source,
            installer,
            detector,
            prompt: Arc::new(AutoConfirm),
            discovery,
            in_flight: Mutex::new(HashMap::new()),
            last_discovered: Mutex::new(BTreeSet::new()),
        }
    }

    /// Wire the default HTTP, subprocess and filesystem collaborators from configuration
    pub fn from_config(config: &RuntimeConfig, loader: &HierarchicalConfigLoader) -> Result<Self> {
        let fallback_dir = std::env::current_dir()?;
        let command = PackageManagerCommand::from_config(&config.package_manager, fallback_dir);

        let store = Arc::new(ComponentStore::new(
            loader.state_file_path(config),
            loader.legacy_config_path(config),
        ));
        let source = Arc::new(GitHubDiscovery::from_config(config)?);
        let verifier = Arc::new(PackagistVerifier::from_config(config)?);
        let detector = Arc::new(ManifestScanDetector::new(command.working_dir.clone()));
        let installer = SecureInstaller::new(Arc::new(CommandRunner::new()), verifier, command);

        Ok(Self::new(
            store,
            source,
            installer,
            detector,
            config.discovery.clone(),
        ))
    }

    /// Replace the confirmation capability
    pub fn with_prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    /// Bootstrap storage and optionally import the legacy configuration
    pub fn initialize_storage(&self, migrate: bool) -> Result<StorageInit> {
        let created = self.store.initialize_if_needed()?;
        let migration = if migrate {
            Some(self.store.migrate_from_legacy_format()?)
        } else {
            None
        };
        Ok(StorageInit { created, migration })
    }

    pub fn list_installed(&self) -> Result<Vec<Component>> {
        Ok(self.store.get_installed()?.into_values().collect())
    }

    /// Candidates tagged with the marker that are not already active
    pub async fn discover(&self) -> Result<Vec<DiscoveredCandidate>> {
        let active: Vec<Component> = self
            .store
            .get_installed()?
            .into_values()
            .filter(Component::is_active)
            .collect();

        let mut candidates = self
            .source
            .discover(&self.discovery.marker_topic, self.discovery.per_page)
            .await;

        if candidates.is_empty() && self.discovery.fallback_to_local {
            debug!(
                "Remote discovery returned nothing, using {} local registry entries",
                self.discovery.local_registry.len()
            );
            candidates = self
                .discovery
                .local_registry
                .iter()
                .map(DiscoveredCandidate::from)
                .collect();
        }

        candidates.retain(|candidate| {
            !active
                .iter()
                .any(|c| c.name == candidate.name || c.package == candidate.full_name)
        });

        let mut last = self
            .last_discovered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = candidates
            .iter()
            .flat_map(|c| [c.name.clone(), c.full_name.clone()])
            .collect();

        info!("Discovered {} installable components", candidates.len());
        Ok(candidates)
    }

    /// Discover, verify, install, detect and register a component
    pub async fn install(&self, name: &str) -> Result<InstallOutcome> {
        self.ensure_not_active(name)?;

        let candidate = self
            .discover()
            .await?
            .into_iter()
            .find(|c| c.matches(name))
            .ok_or_else(|| Error::component_not_found(name))?;

        let _flight = self.begin(
            &candidate.full_name,
            &candidate.name,
            ComponentState::Installing,
        )?;
        self.ensure_not_active(&candidate.name)?;
        self.ensure_not_active(&candidate.full_name)?;

        if !self.prompt.confirm_install(&candidate) {
            info!("Installation of {} cancelled", candidate.full_name);
            return Ok(InstallOutcome::Cancelled);
        }

        let outcome = self.installer.install(&candidate).await?;
        if !outcome.succeeded {
            warn!("Package manager failed to install {}", candidate.full_name);
            return Err(Error::process_failure(&candidate.full_name, outcome.stderr));
        }

        let hooks = self.detector.detect_hooks(&candidate.full_name);
        let commands = self.detector.detect_commands(&candidate.full_name, &hooks);
        debug!(
            "Detected {} hooks and {} commands for {}",
            hooks.len(),
            commands.len(),
            candidate.full_name
        );

        let mut record = candidate.to_record();
        record.version = self.detector.installed_version(&candidate.full_name);
        record.service_hooks = hooks;
        record.commands = commands;

        let component = self.store.register(&candidate.name, record)?;
        self.forget_discovered(&candidate);
        info!("Installed {} as {}", component.package, component.name);
        Ok(InstallOutcome::Installed(component))
    }

    /// Remove an active component's package, then its store record
    pub async fn uninstall(&self, name: &str) -> Result<UninstallOutcome> {
        let resolved = self.find_active(name)?;
        let _flight = self.begin(&resolved.package, &resolved.name, ComponentState::Removing)?;

        // re-read under the flight so a racing removal is observed
        let component = self.find_active(&resolved.name)?;

        if !self.prompt.confirm_uninstall(&component) {
            info!("Removal of {} cancelled", component.name);
            return Ok(UninstallOutcome::Cancelled);
        }

        let outcome = self.installer.remove(&component.package).await?;
        if !outcome.succeeded {
            warn!(
                "Package manager failed to remove {}, keeping it registered",
                component.package
            );
            return Err(Error::process_failure(&component.package, outcome.stderr));
        }

        self.store.unregister(&component.name)?;
        self.forget_discovered_names(&[component.name.as_str(), component.package.as_str()]);
        info!("Uninstalled {}", component.name);
        Ok(UninstallOutcome::Removed(component))
    }

    /// Mark an installed component active or inactive without touching its package
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<Component> {
        let component = self
            .find_installed(name)?
            .ok_or_else(|| Error::not_installed(name))?;
        let _flight = self.begin(&component.package, &component.name, ComponentState::Active)?;

        let status = if enabled {
            ComponentStatus::Active
        } else {
            ComponentStatus::Inactive
        };
        self.store.set_status(&component.name, status)?;
        info!("Component {} is now {}", component.name, status);

        self.store
            .get_component(&component.name)?
            .ok_or_else(|| Error::not_installed(&component.name))
    }

    /// Current lifecycle state of `name`
    pub fn state_of(&self, name: &str) -> Result<ComponentState> {
        if let Some(flight) = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .find(|(package, flight)| *package == name || flight.name == name)
            .map(|(_, flight)| flight.clone())
        {
            return Ok(flight.state);
        }

        if self.find_installed(name)?.is_some_and(|c| c.is_active()) {
            return Ok(ComponentState::Active);
        }

        let discovered = self
            .last_discovered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(name);
        Ok(if discovered {
            ComponentState::Discovered
        } else {
            ComponentState::Unknown
        })
    }

    pub fn get_setting(&self, key: &str, default: Value) -> Result<Value> {
        self.store.get_setting(key, default)
    }

    pub fn set_setting(&self, key: &str, value: Value) -> Result<()> {
        self.store.set_setting(key, value)
    }

    /// Whether confirmation prompts are enabled (defaults to true)
    pub fn interactive_mode(&self) -> Result<bool> {
        Ok(self
            .store
            .get_setting(INTERACTIVE_MODE_SETTING, Value::Bool(true))?
            .as_bool()
            .unwrap_or(true))
    }

    /// Look up by local name, then by package identifier
    fn find_installed(&self, name: &str) -> Result<Option<Component>> {
        let mut installed = self.store.get_installed()?;
        if let Some(component) = installed.remove(name) {
            return Ok(Some(component));
        }
        Ok(installed.into_values().find(|c| c.package == name))
    }

    fn forget_discovered(&self, candidate: &DiscoveredCandidate) {
        self.forget_discovered_names(&[candidate.name.as_str(), candidate.full_name.as_str()]);
    }

    fn forget_discovered_names(&self, names: &[&str]) {
        let mut last = self
            .last_discovered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for name in names {
            last.remove(*name);
        }
    }

    fn find_active(&self, name: &str) -> Result<Component> {
        self.find_installed(name)?
            .filter(Component::is_active)
            .ok_or_else(|| Error::not_installed(name))
    }

    fn ensure_not_active(&self, name: &str) -> Result<()> {
        match self.find_installed(name)? {
            Some(existing) if existing.is_active() => Err(Error::already_installed(existing.name)),
            _ => Ok(()),
        }
    }

    /// Claim the in-flight slot for `package`, failing if any transition holds it
    fn begin(&self, package: &str, name: &str, state: ComponentState) -> Result<FlightGuard<'_>> {
        let mut map = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let busy = map.contains_key(package) || map.values().any(|flight| flight.name == name);
        if busy {
            return Err(Error::operation_in_progress(name));
        }
        map.insert(
            package.to_string(),
            Flight {
                name: name.to_string(),
                state,
            },
        );
        Ok(FlightGuard {
            in_flight: &self.in_flight,
            package: package.to_string(),
        })
    }
}
