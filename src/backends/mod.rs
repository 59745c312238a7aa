//! Backend adapters and the provider dispatcher.

pub mod github;
pub mod gitlab;

pub use github::GitHubBackend;
pub use gitlab::GitLabBackend;

use std::time::Duration;

use crate::config::BridgeConfig;
use crate::domain::ports::GistBackend;
use crate::utils::error::{BridgeError, Result};

pub(crate) const USER_AGENT: &str = concat!("gist-bridge/", env!("CARGO_PKG_VERSION"));

/// Which hosted backend the adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    GitHub,
    GitLab,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::GitHub => "github",
            Provider::GitLab => "gitlab",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Provider::GitHub),
            "gitlab" => Ok(Provider::GitLab),
            other => Err(BridgeError::InvalidConfigValue {
                field: "backend.provider".to_string(),
                value: other.to_string(),
                reason: "expected \"github\" or \"gitlab\"".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select the adapter for the configured provider.
///
/// This is the only dispatch logic: the returned trait object forwards every
/// operation to the matching backend.
pub fn create_backend(config: &BridgeConfig) -> Result<Box<dyn GistBackend>> {
    match config.backend.provider.parse::<Provider>()? {
        Provider::GitHub => Ok(Box::new(GitHubBackend::from_config(config)?)),
        Provider::GitLab => Ok(Box::new(GitLabBackend::from_config(config)?)),
    }
}

pub(crate) fn build_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(USER_AGENT)
        .build()
        .map_err(BridgeError::from)
}

/// Strip trailing slashes and default the scheme to https.
pub(crate) fn normalize_host(host: &str) -> String {
    let trimmed = host.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Map non-2xx responses to a structured error.
pub(crate) fn ensure_success(
    backend: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(BridgeError::Status {
            backend,
            status: status.as_u16(),
            url: resp.url().to_string(),
        })
    }
}
