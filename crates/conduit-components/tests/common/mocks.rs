//! Mock implementations for testing
//!
//! Provides mock collaborators for the lifecycle manager so scenarios run
//! without network access or process execution.

#![allow(dead_code)]

use async_trait::async_trait;
use conduit_components::{
    Component, ComponentSource, DiscoveredCandidate, Error, HookDetector, ProcessOutcome,
    ProcessRunner, Prompt, ProvenanceCheck, Result,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Record of a runner invocation
#[derive(Clone, Debug)]
pub struct MockRunInvocation {
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

/// Process runner returning a fixed outcome and recording every call
pub struct MockRunner {
    outcome: Mutex<ProcessOutcome>,
    invocations: Arc<Mutex<Vec<MockRunInvocation>>>,
    delay: Option<Duration>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::succeeding()
    }
}

impl MockRunner {
    pub fn succeeding() -> Self {
        Self::with_outcome(ProcessOutcome {
            succeeded: true,
            stdout: "Package operations: 1 install".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }

    pub fn failing(stderr: &str) -> Self {
        Self::with_outcome(ProcessOutcome {
            succeeded: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: Some(1),
        })
    }

    pub fn with_outcome(outcome: ProcessOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            invocations: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Sleep inside every run so concurrent callers genuinely overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_outcome(&self, outcome: ProcessOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn invocations(&self) -> Vec<MockRunInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    /// Whether any invocation's argv contains `arg`
    pub fn was_invoked_with(&self, arg: &str) -> bool {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .any(|inv| inv.argv.iter().any(|a| a == arg))
    }
}

#[async_trait]
impl ProcessRunner for MockRunner {
    async fn run(&self, argv: &[String], working_dir: &Path, timeout: Duration) -> ProcessOutcome {
        self.invocations.lock().unwrap().push(MockRunInvocation {
            argv: argv.to_vec(),
            working_dir: working_dir.to_path_buf(),
            timeout,
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.lock().unwrap().clone()
    }
}

/// What the mock verifier answers
#[derive(Clone, Debug)]
pub enum VerifierResponse {
    Accept,
    NotFound,
    MissingMarker,
    Unreachable,
}

/// Provenance check with a scripted answer
pub struct MockVerifier {
    response: Mutex<VerifierResponse>,
    checked: Arc<Mutex<Vec<String>>>,
}

impl MockVerifier {
    pub fn new(response: VerifierResponse) -> Self {
        Self {
            response: Mutex::new(response),
            checked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn accepting() -> Self {
        Self::new(VerifierResponse::Accept)
    }

    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProvenanceCheck for MockVerifier {
    async fn verify(&self, candidate: &DiscoveredCandidate) -> Result<()> {
        self.checked
            .lock()
            .unwrap()
            .push(candidate.full_name.clone());
        let response = self.response.lock().unwrap().clone();
        match response {
            VerifierResponse::Accept => Ok(()),
            VerifierResponse::NotFound => Err(Error::not_found(&candidate.full_name)),
            VerifierResponse::MissingMarker => {
                Err(Error::missing_marker(&candidate.full_name, "conduit-component"))
            }
            VerifierResponse::Unreachable => Err(Error::verification_failed(
                &candidate.full_name,
                "connection refused",
            )),
        }
    }
}

/// Discovery source returning a fixed candidate list
pub struct MockSource {
    candidates: Mutex<Vec<DiscoveredCandidate>>,
    queries: Arc<Mutex<Vec<(String, u32)>>>,
}

impl MockSource {
    pub fn new(candidates: Vec<DiscoveredCandidate>) -> Self {
        Self {
            candidates: Mutex::new(candidates),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn queries(&self) -> Vec<(String, u32)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComponentSource for MockSource {
    async fn discover(&self, marker: &str, per_page: u32) -> Vec<DiscoveredCandidate> {
        self.queries
            .lock()
            .unwrap()
            .push((marker.to_string(), per_page));
        self.candidates.lock().unwrap().clone()
    }
}

/// Detector returning fixed hooks, commands and version
#[derive(Default)]
pub struct MockDetector {
    pub hooks: BTreeSet<String>,
    pub commands: BTreeSet<String>,
    pub version: Option<String>,
}

impl MockDetector {
    pub fn new(hooks: &[&str], commands: &[&str]) -> Self {
        Self {
            hooks: hooks.iter().map(|s| s.to_string()).collect(),
            commands: commands.iter().map(|s| s.to_string()).collect(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }
}

impl HookDetector for MockDetector {
    fn detect_hooks(&self, _package: &str) -> BTreeSet<String> {
        self.hooks.clone()
    }

    fn detect_commands(&self, _package: &str, _hooks: &BTreeSet<String>) -> BTreeSet<String> {
        self.commands.clone()
    }

    fn installed_version(&self, _package: &str) -> Option<String> {
        self.version.clone()
    }
}

/// Prompt with a fixed answer that counts how often it was asked
pub struct ScriptedPrompt {
    answer: bool,
    asked: Mutex<usize>,
}

impl ScriptedPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(0),
        }
    }

    pub fn times_asked(&self) -> usize {
        *self.asked.lock().unwrap()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm_install(&self, _candidate: &DiscoveredCandidate) -> bool {
        *self.asked.lock().unwrap() += 1;
        self.answer
    }

    fn confirm_uninstall(&self, _component: &Component) -> bool {
        *self.asked.lock().unwrap() += 1;
        self.answer
    }
}
