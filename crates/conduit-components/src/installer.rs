//! Secure package installation and removal
//!
//! `install` runs validate, verify, execute in that order; any failure before
//! execution returns without spawning a process. `remove` skips provenance
//! since the package is already tracked.

use crate::error::Result;
use crate::runner::{ProcessOutcome, ProcessRunner};
use crate::types::DiscoveredCandidate;
use crate::validation::validate_package_name;
use crate::verifier::ProvenanceCheck;
use conduit_core::types::PackageManagerConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Package manager command layout
#[derive(Debug, Clone)]
pub struct PackageManagerCommand {
    pub program: String,
    pub add_command: String,
    pub add_flags: Vec<String>,
    pub remove_command: String,
    pub remove_flags: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

impl PackageManagerCommand {
    /// Resolve the command layout from configuration; unset working dir means `fallback_dir`
    pub fn from_config(config: &PackageManagerConfig, fallback_dir: PathBuf) -> Self {
        Self {
            program: config.program.clone(),
            add_command: config.add_command.clone(),
            add_flags: config.add_flags.clone(),
            remove_command: config.remove_command.clone(),
            remove_flags: config.remove_flags.clone(),
            working_dir: config.working_dir.clone().unwrap_or(fallback_dir),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn add_argv(&self, package: &str) -> Vec<String> {
        let mut argv = vec![
            self.program.clone(),
            self.add_command.clone(),
            package.to_string(),
        ];
        argv.extend(self.add_flags.iter().cloned());
        argv
    }

    fn remove_argv(&self, package: &str) -> Vec<String> {
        let mut argv = vec![
            self.program.clone(),
            self.remove_command.clone(),
            package.to_string(),
        ];
        argv.extend(self.remove_flags.iter().cloned());
        argv
    }
}

/// Validator, verifier and runner composed into install/remove
pub struct SecureInstaller {
    runner: Arc<dyn ProcessRunner>,
    verifier: Arc<dyn ProvenanceCheck>,
    command: PackageManagerCommand,
}

impl SecureInstaller {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        verifier: Arc<dyn ProvenanceCheck>,
        command: PackageManagerCommand,
    ) -> Self {
        Self {
            runner,
            verifier,
            command,
        }
    }

    /// Application root the package manager runs in
    pub fn working_dir(&self) -> &std::path::Path {
        &self.command.working_dir
    }

    /// Validate, verify and add the candidate's package
    ///
    /// Validation and verification failures are returned as errors. A process
    /// failure is returned as an unsuccessful outcome carrying stderr.
    pub async fn install(&self, candidate: &DiscoveredCandidate) -> Result<ProcessOutcome> {
        validate_package_name(&candidate.full_name)?;
        debug!("{} passed name validation", candidate.full_name);

        self.verifier.verify(candidate).await?;

        info!("Installing {}", candidate.full_name);
        let argv = self.command.add_argv(&candidate.full_name);
        Ok(self
            .runner
            .run(&argv, &self.command.working_dir, self.command.timeout)
            .await)
    }

    /// Validate and remove a tracked package
    pub async fn remove(&self, package: &str) -> Result<ProcessOutcome> {
        validate_package_name(package)?;

        info!("Removing {}", package);
        let argv = self.command.remove_argv(package);
        Ok(self
            .runner
            .run(&argv, &self.command.working_dir, self.command.timeout)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_argv_layout() {
        let command = PackageManagerCommand::from_config(
            &PackageManagerConfig::default(),
            PathBuf::from("/app"),
        );
        assert_eq!(
            command.add_argv("acme/widgets"),
            vec![
                "composer",
                "require",
                "acme/widgets",
                "--no-interaction",
                "--no-progress",
                "--prefer-dist"
            ]
        );
        assert_eq!(
            command.remove_argv("acme/widgets"),
            vec![
                "composer",
                "remove",
                "acme/widgets",
                "--no-interaction",
                "--no-progress"
            ]
        );
        assert_eq!(command.working_dir, PathBuf::from("/app"));
        assert_eq!(command.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_configured_working_dir_wins() {
        let config = PackageManagerConfig {
            working_dir: Some(PathBuf::from("/srv/app")),
            ..Default::default()
        };
        let command = PackageManagerCommand::from_config(&config, PathBuf::from("/app"));
        assert_eq!(command.working_dir, PathBuf::from("/srv/app"));
    }
}
