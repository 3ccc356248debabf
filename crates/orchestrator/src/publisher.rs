use std::sync::Arc;

use chrono::{Datelike, Utc};
use deploy_core::{FileArtifact, Job, RepoNaming, RepositoryHandle};
use github::{GitHubError, RepositoryStore};
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, Result};
use crate::prompts::RepoDocs;

pub const INDEX_PATH: &str = "index.html";
pub const README_PATH: &str = "README.md";
pub const LICENSE_PATH: &str = "LICENSE";

const REPO_DESCRIPTION: &str = "Auto-generated single-page application";

/// Create-or-update access to the job's repository and its files.
pub struct RepositoryPublisher {
    store: Arc<dyn RepositoryStore>,
    prefix: String,
    naming: RepoNaming,
}

impl RepositoryPublisher {
    pub fn new(store: Arc<dyn RepositoryStore>, prefix: impl Into<String>, naming: RepoNaming) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            naming,
        }
    }

    pub fn repository_name(&self, task_id: &str, round: u32) -> String {
        self.naming.repository_name(&self.prefix, task_id, round)
    }

    /// Resolve the repository for this round, creating it when the round is
    /// allowed to start from nothing.
    pub async fn ensure_repository(&self, task_id: &str, round: u32) -> Result<RepositoryHandle> {
        let name = self.repository_name(task_id, round);

        if self.naming.expects_existing(round) {
            return match self.store.get_repository(&name).await {
                Ok(repo) => {
                    info!("Using existing repository {}", repo.full_name());
                    Ok(repo)
                }
                Err(GitHubError::RepoNotFound { .. }) => {
                    Err(OrchestratorError::RepositoryMissing { repo: name, round })
                }
                Err(e) => Err(e.into()),
            };
        }

        match self.store.create_repository(&name, REPO_DESCRIPTION).await {
            Ok(repo) => {
                info!("Created repository {}", repo.full_name());
                Ok(repo)
            }
            Err(GitHubError::AlreadyExists(_)) => {
                info!("Repository {} already exists, reusing it", name);
                Ok(self.store.get_repository(&name).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read_file(&self, repo: &RepositoryHandle, path: &str) -> Result<Option<String>> {
        let file = self.store.get_file(repo, path).await?;
        Ok(file.map(|f| f.content))
    }

    /// Write `artifact`, updating in place when the path already exists.
    /// Returns the sha of the resulting commit.
    pub async fn put_file(&self, repo: &RepositoryHandle, artifact: &FileArtifact) -> Result<String> {
        let sha = match self.store.get_file(repo, &artifact.path).await? {
            Some(existing) => {
                debug!("{} exists at blob {}, updating", artifact.path, existing.sha);
                self.store.update_file(repo, artifact, &existing.sha).await?
            }
            None => {
                debug!("{} not found, creating", artifact.path);
                self.store.create_file(repo, artifact).await?
            }
        };

        info!("Committed {} to {} ({})", artifact.path, repo.full_name(), sha);
        Ok(sha)
    }

    /// Commit the application, license (first round only) and README, then
    /// report the head of the default branch.
    pub async fn publish_files(&self, repo: &RepositoryHandle, job: &Job, code: &str) -> Result<String> {
        let mut artifacts = vec![FileArtifact::new(
            INDEX_PATH,
            format!("feat: Update for round {}", job.round),
            code,
        )];

        if job.round == 1 {
            artifacts.push(FileArtifact::new(
                LICENSE_PATH,
                "docs: Add MIT License",
                RepoDocs::mit_license(Utc::now().year(), &repo.owner),
            ));
        }

        artifacts.push(FileArtifact::new(
            README_PATH,
            format!("docs: Update README for round {}", job.round),
            RepoDocs::readme(&repo.name, job, &repo.pages_url()),
        ));

        let mut last_sha = String::new();
        for artifact in &artifacts {
            last_sha = self.put_file(repo, artifact).await?;
        }

        match self.store.latest_commit(repo, &repo.default_branch).await {
            Ok(sha) => Ok(sha),
            Err(e) => {
                warn!("Could not read head of {}: {}, using last write", repo.default_branch, e);
                Ok(last_sha)
            }
        }
    }
}
