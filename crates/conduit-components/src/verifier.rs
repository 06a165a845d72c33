//! Provenance verification
//!
//! A candidate may only be installed when it exists on the package index and
//! carries the marker, either as an index keyword or as a topic on its source
//! repository. The repository topic lookup only happens when the index
//! answered and the keyword was absent. Transport failures fail closed.

use crate::error::{Error, Result};
use crate::types::DiscoveredCandidate;
use async_trait::async_trait;
use conduit_core::RuntimeConfig;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

static GITHUB_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://(?:www\.)?github\.com/|git@github\.com:)([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$")
        .expect("github url pattern is valid")
});

/// Confirms a candidate is a genuine, marked component before installation
#[async_trait]
pub trait ProvenanceCheck: Send + Sync {
    async fn verify(&self, candidate: &DiscoveredCandidate) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct PackageEnvelope {
    package: PackageMetadata,
}

#[derive(Debug, Deserialize)]
struct PackageMetadata {
    #[serde(default)]
    keywords: Vec<String>,
    repository: Option<String>,
    #[serde(default)]
    versions: HashMap<String, VersionMetadata>,
}

#[derive(Debug, Deserialize)]
struct VersionMetadata {
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
    #[serde(default)]
    names: Vec<String>,
}

impl PackageMetadata {
    fn has_keyword(&self, marker: &str) -> bool {
        self.keywords.iter().any(|k| k == marker)
            || self
                .versions
                .values()
                .any(|v| v.keywords.iter().any(|k| k == marker))
    }
}

/// Extract `(owner, repo)` from a GitHub repository URL
pub fn parse_github_repo(url: &str) -> Option<(String, String)> {
    let caps = GITHUB_REPO_RE.captures(url.trim())?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Packagist index check with GitHub topic fallback
pub struct PackagistVerifier {
    client: reqwest::Client,
    index_url: String,
    github_api_url: String,
    marker: String,
    token: Option<String>,
}

impl PackagistVerifier {
    pub fn new(
        index_url: impl Into<String>,
        github_api_url: impl Into<String>,
        marker: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::Config(conduit_core::Error::invalid_config(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            client,
            index_url: index_url.into().trim_end_matches('/').to_string(),
            github_api_url: github_api_url.into().trim_end_matches('/').to_string(),
            marker: marker.into(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        Self::new(
            config.provenance.index_url.clone(),
            config.provenance.github_api_url.clone(),
            config.discovery.marker_topic.clone(),
            &config.network.user_agent,
            Duration::from_secs(config.network.http_timeout_secs),
            std::env::var("GITHUB_TOKEN").ok(),
        )
    }

    async fn fetch_metadata(&self, package: &str) -> Result<PackageMetadata> {
        let url = format!("{}/packages/{}.json", self.index_url, package);
        debug!("Fetching package metadata from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::verification_failed(package, format!("package index unreachable: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found(package));
        }
        if !status.is_success() {
            return Err(Error::verification_failed(
                package,
                format!("package index returned {}", status),
            ));
        }

        let envelope: PackageEnvelope = response.json().await.map_err(|e| {
            Error::verification_failed(package, format!("unreadable package metadata: {}", e))
        })?;
        Ok(envelope.package)
    }

    async fn repository_has_topic(&self, package: &str, owner: &str, repo: &str) -> Result<bool> {
        let url = format!("{}/repos/{}/{}/topics", self.github_api_url, owner, repo);
        debug!("Checking repository topics at {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            Error::verification_failed(package, format!("repository topics unreachable: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::verification_failed(
                package,
                format!("repository topics lookup returned {}", status),
            ));
        }

        let topics: TopicsResponse = response.json().await.map_err(|e| {
            Error::verification_failed(package, format!("unreadable repository topics: {}", e))
        })?;
        Ok(topics.names.iter().any(|t| t == &self.marker))
    }
}

#[async_trait]
impl ProvenanceCheck for PackagistVerifier {
    async fn verify(&self, candidate: &DiscoveredCandidate) -> Result<()> {
        let package = candidate.full_name.as_str();
        let metadata = self.fetch_metadata(package).await?;

        if metadata.has_keyword(&self.marker) {
            info!("Verified {} via package index keyword", package);
            return Ok(());
        }

        let Some((owner, repo)) = metadata.repository.as_deref().and_then(parse_github_repo)
        else {
            debug!("{} has no GitHub repository to check for topics", package);
            return Err(Error::missing_marker(package, &self.marker));
        };

        if self.repository_has_topic(package, &owner, &repo).await? {
            info!("Verified {} via repository topic", package);
            Ok(())
        } else {
            Err(Error::missing_marker(package, &self.marker))
        }
    }
}
