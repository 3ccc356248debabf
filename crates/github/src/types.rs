use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`crate::GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Account that owns every repository the client creates.
    pub owner: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl GitHubConfig {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Repositories
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct CreateRepoRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub private: bool,
    pub auto_init: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoResponse {
    pub name: String,
    pub owner: OwnerResponse,
    pub default_branch: Option<String>,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerResponse {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchResponse {
    pub commit: CommitRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitRef {
    pub sha: String,
}

// =============================================================================
// Contents
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct RefQuery<'a> {
    #[serde(rename = "ref")]
    pub git_ref: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentResponse {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlobResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PutFileRequest<'a> {
    pub message: &'a str,
    /// Base64-encoded file body.
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PutFileResponse {
    pub commit: CommitRef,
}

// =============================================================================
// Pages
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct PagesRequest<'a> {
    pub source: PagesSource<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PagesSource<'a> {
    pub branch: &'a str,
    pub path: &'a str,
}
