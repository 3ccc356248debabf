use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::job::Job;
use super::repository::RepositoryHandle;

pub const PAGES_SOURCE_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PagesStatus {
    Requested,
    Pending,
    Live,
    /// Hosting was requested but the site never answered a liveness probe.
    Unconfirmed,
}

/// Static-hosting publication of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PagesDeployment {
    pub repository: String,
    pub branch: String,
    pub source_path: String,
    pub url: String,
    pub status: PagesStatus,
}

impl PagesDeployment {
    pub fn requested(repo: &RepositoryHandle) -> Self {
        Self {
            repository: repo.full_name(),
            branch: repo.default_branch.clone(),
            source_path: PAGES_SOURCE_PATH.to_string(),
            url: repo.pages_url(),
            status: PagesStatus::Requested,
        }
    }

    pub fn with_status(mut self, status: PagesStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_live(&self) -> bool {
        self.status == PagesStatus::Live
    }
}

/// Body posted to the evaluation callback once a job completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationPayload {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

impl NotificationPayload {
    pub fn new(
        job: &Job,
        repo: &RepositoryHandle,
        commit_sha: impl Into<String>,
        pages_url: impl Into<String>,
    ) -> Self {
        Self {
            email: job.email.clone(),
            task: job.task_id.clone(),
            round: job.round,
            nonce: job.nonce.clone(),
            repo_url: repo.html_url.clone(),
            commit_sha: commit_sha.into(),
            pages_url: pages_url.into(),
        }
    }
}
