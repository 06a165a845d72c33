//! Post-install introspection of service hooks and commands
//!
//! Detection is best-effort static analysis of files the package manager
//! placed under `vendor/`. Nothing here executes package code, and nothing
//! here fails: unreadable or missing inputs are logged and skipped.

use crate::validation::is_valid_package_name;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Conventional command locations under a package or namespace root
const COMMAND_SUBPATHS: &[&str] = &["src/Commands", "app/Commands", "Commands"];

static SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:protected|public)\s+\$signature\s*=\s*['"]([^'"]+)['"]"#)
        .expect("signature pattern is valid")
});

static COMMAND_ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@Command\(\s*['"]([^'"]+)['"]"#).expect("command attribute pattern is valid")
});

/// Discovers what an installed package contributes to the host application
pub trait HookDetector: Send + Sync {
    /// Service hook identifiers declared by the package manifest
    fn detect_hooks(&self, package: &str) -> BTreeSet<String>;

    /// Command names exposed by the package and its hooks
    fn detect_commands(&self, package: &str, hooks: &BTreeSet<String>) -> BTreeSet<String>;

    /// Locked version of an installed package, if known
    fn installed_version(&self, package: &str) -> Option<String>;
}

/// Manifest and source-tree scanning detector rooted at an application directory
#[derive(Debug, Clone)]
pub struct ManifestScanDetector {
    app_root: PathBuf,
}

impl ManifestScanDetector {
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
        }
    }

    fn vendor_dir(&self) -> PathBuf {
        self.app_root.join("vendor")
    }

    fn read_manifest(&self, package: &str) -> Option<Value> {
        if !is_valid_package_name(package) {
            warn!("Refusing to inspect invalid package name {:?}", package);
            return None;
        }

        let manifest_path = self.vendor_dir().join(package).join("composer.json");
        let content = match fs::read_to_string(&manifest_path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No manifest at {}: {}", manifest_path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed manifest {}: {}", manifest_path.display(), e);
                None
            }
        }
    }

    /// Directories worth scanning for command classes
    fn command_dirs(&self, package: &str, hooks: &BTreeSet<String>) -> BTreeSet<PathBuf> {
        let vendor = self.vendor_dir();
        let mut roots = BTreeSet::new();

        if is_valid_package_name(package) {
            roots.insert(vendor.join(package));
        }

        for hook in hooks {
            match namespace_root(hook) {
                Some((ns0, ns1)) => {
                    roots.insert(vendor.join(ns0).join(ns1));
                }
                None => debug!("Hook {} has no vendor namespace to scan", hook),
            }
        }

        roots
            .iter()
            .flat_map(|root| COMMAND_SUBPATHS.iter().map(move |sub| root.join(sub)))
            .collect()
    }
}

/// `Acme\Widgets\Provider` -> (`acme`, `widgets`)
fn namespace_root(hook: &str) -> Option<(String, String)> {
    let mut parts = hook.trim_start_matches('\\').split('\\');
    let ns0 = parts.next().filter(|s| is_path_segment(s))?;
    let ns1 = parts.next().filter(|s| is_path_segment(s))?;
    Some((ns0.to_lowercase(), ns1.to_lowercase()))
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn string_list(value: Option<&Value>) -> impl Iterator<Item = String> + '_ {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
}

/// Command names declared in one source file
fn scan_source(content: &str) -> impl Iterator<Item = String> + '_ {
    SIGNATURE_RE
        .captures_iter(content)
        .chain(COMMAND_ATTRIBUTE_RE.captures_iter(content))
        .filter_map(|caps| {
            caps.get(1)
                .and_then(|m| m.as_str().split_whitespace().next())
                .map(str::to_string)
        })
}

fn scan_dir(dir: &Path, commands: &mut BTreeSet<String>) {
    if !dir.is_dir() {
        return;
    }

    let pattern = format!(
        "{}/*.php",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Skipping {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        match fs::read_to_string(&path) {
            Ok(content) => {
                for name in scan_source(&content) {
                    debug!("Found command {} in {}", name, path.display());
                    commands.insert(name);
                }
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
}

impl HookDetector for ManifestScanDetector {
    fn detect_hooks(&self, package: &str) -> BTreeSet<String> {
        let Some(manifest) = self.read_manifest(package) else {
            return BTreeSet::new();
        };

        let extra = manifest.get("extra");
        let laravel = extra.and_then(|e| e.pointer("/laravel/providers"));
        let conduit = extra.and_then(|e| e.pointer("/conduit/providers"));

        string_list(laravel).chain(string_list(conduit)).collect()
    }

    fn detect_commands(&self, package: &str, hooks: &BTreeSet<String>) -> BTreeSet<String> {
        let mut commands = BTreeSet::new();

        if let Some(manifest) = self.read_manifest(package) {
            commands.extend(string_list(manifest.pointer("/extra/conduit/commands")));
        }

        for dir in self.command_dirs(package, hooks) {
            scan_dir(&dir, &mut commands);
        }

        commands
    }

    fn installed_version(&self, package: &str) -> Option<String> {
        let lock_path = self.app_root.join("composer.lock");
        let content = fs::read_to_string(&lock_path).ok()?;
        let lock: Value = match serde_json::from_str(&content) {
            Ok(lock) => lock,
            Err(e) => {
                warn!("Ignoring malformed {}: {}", lock_path.display(), e);
                return None;
            }
        };

        ["packages", "packages-dev"]
            .iter()
            .filter_map(|section| lock.get(section).and_then(Value::as_array))
            .flatten()
            .find(|p| p.get("name").and_then(Value::as_str) == Some(package))
            .and_then(|p| p.get("version").and_then(Value::as_str))
            .map(str::to_string)
    }
}
