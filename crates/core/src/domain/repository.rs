use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

pub const DEFAULT_REPO_PREFIX: &str = "tds";
/// Branch assumed when the platform does not report one.
pub const DEFAULT_BRANCH: &str = "main";

/// A repository on the source-hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RepositoryHandle {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub html_url: String,
}

impl RepositoryHandle {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Public static-hosting URL for this repository.
    pub fn pages_url(&self) -> String {
        format!(
            "https://{}.github.io/{}/",
            self.owner.to_lowercase(),
            self.name
        )
    }
}

/// How a task identifier maps to a repository name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RepoNaming {
    /// Every round revises the same repository.
    #[default]
    InPlace,
    /// Every round gets its own repository, suffixed with `-r{round}`.
    PerRound,
}

impl RepoNaming {
    pub fn repository_name(&self, prefix: &str, task_id: &str, round: u32) -> String {
        let slug = slugify(task_id);
        match self {
            Self::InPlace => format!("{}-{}", prefix, slug),
            Self::PerRound => format!("{}-{}-r{}", prefix, slug, round),
        }
    }

    /// Whether a round of this job must find an existing repository.
    pub fn expects_existing(&self, round: u32) -> bool {
        match self {
            Self::InPlace => round > 1,
            Self::PerRound => false,
        }
    }
}

/// Lossy slugs get the first 8 hex digits of the id's SHA-256 appended, so
/// ids differing only in replaced characters stay distinct.
fn slugify(task_id: &str) -> String {
    let slug: String = task_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if slug == task_id {
        return slug;
    }

    let digest = Sha256::digest(task_id.as_bytes());
    let suffix: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", slug, suffix)
}

/// A single file written to a repository in one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileArtifact {
    pub path: String,
    pub message: String,
    pub content: String,
}

impl FileArtifact {
    pub fn new(
        path: impl Into<String>,
        message: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            content: content.into(),
        }
    }
}
