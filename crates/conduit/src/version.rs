//! Build metadata reported by `conduit version`

use serde::Serialize;

/// What was built, from which revision, for which platform
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_revision: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub built_at: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<&'static str>,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            git_revision: option_env!("CONDUIT_GIT_REVISION"),
            built_at: option_env!("CONDUIT_BUILT_AT"),
            target: option_env!("CONDUIT_TARGET"),
            profile: option_env!("CONDUIT_PROFILE"),
        }
    }

    /// One-line summary, e.g. `conduit 0.4.0 (abc1234, x86_64-unknown-linux-gnu)`
    pub fn summary(&self) -> String {
        let details: Vec<&str> = [self.git_revision, self.target].into_iter().flatten().collect();
        if details.is_empty() {
            format!("{} {}", self.name, self.version)
        } else {
            format!("{} {} ({})", self.name, self.version, details.join(", "))
        }
    }

    /// Whether the binary was built from a tree with uncommitted changes
    pub fn is_dirty(&self) -> bool {
        self.git_revision.is_some_and(|rev| rev.ends_with("-dirty"))
    }
}
