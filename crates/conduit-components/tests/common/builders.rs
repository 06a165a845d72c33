//! Builders for candidates and a fully wired manager fixture

use super::constants::*;
use super::mocks::*;
use conduit_components::{
    ComponentManager, ComponentStore, DiscoveredCandidate, PackageManagerCommand, Prompt,
    SecureInstaller,
};
use conduit_core::types::{DiscoveryConfig, PackageManagerConfig};
use std::sync::Arc;
use tempfile::TempDir;

/// Builder for discovered candidates
pub struct CandidateBuilder {
    candidate: DiscoveredCandidate,
}

impl CandidateBuilder {
    pub fn new(name: &str, full_name: &str) -> Self {
        Self {
            candidate: DiscoveredCandidate {
                name: name.to_string(),
                full_name: full_name.to_string(),
                description: format!("{} component", name),
                url: format!("https://github.com/{}", full_name),
                topics: vec![MARKER.to_string()],
                updated_at: Some("2026-09-01T12:00:00Z".to_string()),
                star_count: 3,
                language: "PHP".to_string(),
                license: "MIT".to_string(),
            },
        }
    }

    pub fn widgets() -> Self {
        Self::new(WIDGETS_NAME, WIDGETS_PACKAGE)
    }

    pub fn stars(mut self, stars: u64) -> Self {
        self.candidate.star_count = stars;
        self
    }

    pub fn build(self) -> DiscoveredCandidate {
        self.candidate
    }
}

/// Everything a lifecycle scenario needs, backed by a temp directory
pub struct ManagerFixture {
    pub temp: TempDir,
    pub store: Arc<ComponentStore>,
    pub runner: Arc<MockRunner>,
    pub verifier: Arc<MockVerifier>,
    pub source: Arc<MockSource>,
    pub manager: ComponentManager,
}

pub struct ManagerFixtureBuilder {
    candidates: Vec<DiscoveredCandidate>,
    runner: MockRunner,
    verifier: MockVerifier,
    detector: MockDetector,
    discovery: DiscoveryConfig,
    prompt: Option<Arc<dyn Prompt>>,
    initialize: bool,
}

impl Default for ManagerFixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagerFixtureBuilder {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            runner: MockRunner::succeeding(),
            verifier: MockVerifier::accepting(),
            detector: MockDetector::default(),
            discovery: DiscoveryConfig::default(),
            prompt: None,
            initialize: true,
        }
    }

    pub fn candidate(mut self, candidate: DiscoveredCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn runner(mut self, runner: MockRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn verifier(mut self, verifier: MockVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn detector(mut self, detector: MockDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn uninitialized(mut self) -> Self {
        self.initialize = false;
        self
    }

    pub fn build(self) -> ManagerFixture {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(ComponentStore::new(
            temp.path().join(".conduit/conduit.json"),
            temp.path().join(".conduit/components.yaml"),
        ));
        if self.initialize {
            store.initialize_if_needed().unwrap();
        }

        let runner = Arc::new(self.runner);
        let verifier = Arc::new(self.verifier);
        let source = Arc::new(MockSource::new(self.candidates));
        let command =
            PackageManagerCommand::from_config(&PackageManagerConfig::default(), temp.path().to_path_buf());
        let installer = SecureInstaller::new(runner.clone(), verifier.clone(), command);

        let mut manager = ComponentManager::new(
            store.clone(),
            source.clone(),
            installer,
            Arc::new(self.detector),
            self.discovery,
        );
        if let Some(prompt) = self.prompt {
            manager = manager.with_prompt(prompt);
        }

        ManagerFixture {
            temp,
            store,
            runner,
            verifier,
            source,
            manager,
        }
    }
}
