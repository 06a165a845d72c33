//! Remote component discovery
//!
//! Queries a GitHub-compatible repository search API for repositories tagged
//! with the marker topic. Discovery fails softly: any transport, status or
//! payload problem is logged and produces an empty list.

use crate::error::{Error, Result};
use crate::types::DiscoveredCandidate;
use crate::validation::is_valid_package_name;
use async_trait::async_trait;
use conduit_core::RuntimeConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_DESCRIPTION: &str = "No description available";
const DEFAULT_LANGUAGE: &str = "Unknown";
const DEFAULT_LICENSE: &str = "No license";

/// Source of installable component candidates
#[async_trait]
pub trait ComponentSource: Send + Sync {
    /// List repositories tagged with `marker`, most recently updated first
    async fn discover(&self, marker: &str, per_page: u32) -> Vec<DiscoveredCandidate>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    incomplete_results: bool,
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    name: String,
    full_name: String,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    topics: Vec<String>,
    updated_at: Option<String>,
    stargazers_count: Option<u64>,
    language: Option<String>,
    license: Option<SearchLicense>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct SearchLicense {
    name: Option<String>,
}

impl From<SearchItem> for DiscoveredCandidate {
    fn from(item: SearchItem) -> Self {
        Self {
            name: item.name,
            full_name: item.full_name,
            description: item
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            url: item.html_url,
            topics: item.topics,
            updated_at: item.updated_at,
            star_count: item.stargazers_count.unwrap_or(0),
            language: item
                .language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            license: item
                .license
                .and_then(|l| l.name)
                .unwrap_or_else(|| DEFAULT_LICENSE.to_string()),
        }
    }
}

/// GitHub repository search backed discovery
pub struct GitHubDiscovery {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubDiscovery {
    /// Create a discovery client against `api_url`
    pub fn new(
        api_url: impl Into<String>,
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
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Create a discovery client from runtime configuration, picking up GITHUB_TOKEN
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        Self::new(
            config.discovery.api_url.clone(),
            &config.network.user_agent,
            Duration::from_secs(config.network.http_timeout_secs),
            std::env::var("GITHUB_TOKEN").ok(),
        )
    }

    async fn search(&self, marker: &str, per_page: u32) -> anyhow::Result<SearchResponse> {
        let per_page = per_page.clamp(1, 100).to_string();
        let query = format!("topic:{}", marker);
        let mut url = Url::parse(&format!("{}/search/repositories", self.api_url))?;
        url.query_pairs_mut()
            .append_pair("q", &query)
            .append_pair("sort", "updated")
            .append_pair("order", "desc")
            .append_pair("per_page", &per_page);

        debug!("Searching {}", url);

        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 403 || status.as_u16() == 429 {
                anyhow::bail!("search API rate limited the request ({})", status);
            }
            anyhow::bail!("search API returned {}", status);
        }

        Ok(response.json::<SearchResponse>().await?)
    }
}

#[async_trait]
impl ComponentSource for GitHubDiscovery {
    async fn discover(&self, marker: &str, per_page: u32) -> Vec<DiscoveredCandidate> {
        let response = match self.search(marker, per_page).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Component discovery failed: {}", e);
                return Vec::new();
            }
        };

        if response.incomplete_results {
            debug!("Search results are incomplete");
        }
        debug!(
            "Search matched {} repositories, {} returned",
            response.total_count,
            response.items.len()
        );

        response
            .items
            .into_iter()
            .filter(|item| {
                if item.archived || item.disabled {
                    debug!("Skipping archived or disabled repository {}", item.full_name);
                    return false;
                }
                true
            })
            .map(DiscoveredCandidate::from)
            .inspect(|candidate| {
                if !is_valid_package_name(&candidate.full_name) {
                    debug!(
                        "Discovered {} is not a valid package name and cannot be installed",
                        candidate.full_name
                    );
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> GitHubDiscovery {
        GitHubDiscovery::new(
            server.uri(),
            "conduit-test",
            Duration::from_secs(5),
            token.map(str::to_string),
        )
        .unwrap()
    }

    fn item(name: &str, archived: bool, disabled: bool) -> serde_json::Value {
        json!({
            "name": name,
            "full_name": format!("acme/{}", name),
            "description": null,
            "html_url": format!("https://github.com/acme/{}", name),
            "topics": ["conduit-component"],
            "updated_at": "2026-01-01T00:00:00Z",
            "stargazers_count": null,
            "language": null,
            "license": null,
            "archived": archived,
            "disabled": disabled
        })
    }

    #[tokio::test]
    async fn test_discover_filters_archived_and_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .and(query_param("q", "topic:conduit-component"))
            .and(query_param("sort", "updated"))
            .and(query_param("order", "desc"))
            .and(query_param("per_page", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 3,
                "incomplete_results": false,
                "items": [
                    item("old", true, false),
                    item("locked", false, true),
                    item("widgets", false, false)
                ]
            })))
            .mount(&server)
            .await;

        let found = client(&server, None)
            .discover("conduit-component", 50)
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_name, "acme/widgets");
    }

    #[tokio::test]
    async fn test_discover_applies_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 1,
                "incomplete_results": false,
                "items": [item("widgets", false, false)]
            })))
            .mount(&server)
            .await;

        let found = client(&server, None).discover("conduit-component", 10).await;
        let c = &found[0];
        assert_eq!(c.description, "No description available");
        assert_eq!(c.star_count, 0);
        assert_eq!(c.language, "Unknown");
        assert_eq!(c.license, "No license");
        assert_eq!(c.topics, vec!["conduit-component"]);
    }

    #[tokio::test]
    async fn test_per_page_is_clamped_and_token_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .and(query_param("per_page", "100"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 0,
                "incomplete_results": false,
                "items": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let found = client(&server, Some("secret"))
            .discover("conduit-component", 500)
            .await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        assert!(client(&server, None)
            .discover("conduit-component", 50)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(client(&server, None)
            .discover("conduit-component", 50)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_empty() {
        let discovery = GitHubDiscovery::new(
            "http://127.0.0.1:1",
            "conduit-test",
            Duration::from_secs(2),
            None,
        )
        .unwrap();
        assert!(discovery.discover("conduit-component", 50).await.is_empty());
    }
}
