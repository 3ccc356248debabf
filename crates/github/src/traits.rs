use async_trait::async_trait;
use deploy_core::{FileArtifact, RepositoryHandle};

use crate::error::Result;

/// A file as currently stored in a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    /// Revision marker required to update the file in place.
    pub sha: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagesActivation {
    Enabled,
    AlreadyEnabled,
}

/// Repository operations the publishing workflow relies on.
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Create a public repository. Fails with `AlreadyExists` when the name is taken.
    async fn create_repository(&self, name: &str, description: &str) -> Result<RepositoryHandle>;

    /// Fetch a repository owned by the configured account. Fails with `RepoNotFound`.
    async fn get_repository(&self, name: &str) -> Result<RepositoryHandle>;

    /// Read a file from the default branch. `Ok(None)` when the path does not exist.
    async fn get_file(&self, repo: &RepositoryHandle, path: &str) -> Result<Option<RemoteFile>>;

    /// Create a new file, returning the commit sha.
    async fn create_file(&self, repo: &RepositoryHandle, artifact: &FileArtifact) -> Result<String>;

    /// Replace an existing file whose current blob is `sha`, returning the commit sha.
    async fn update_file(
        &self,
        repo: &RepositoryHandle,
        artifact: &FileArtifact,
        sha: &str,
    ) -> Result<String>;

    /// Sha of the newest commit on `branch`.
    async fn latest_commit(&self, repo: &RepositoryHandle, branch: &str) -> Result<String>;
}

/// Static site hosting for repositories.
#[async_trait]
pub trait PagesHost: Send + Sync {
    /// Ask the platform to serve `path` of `branch`. A repository the hosting
    /// subsystem has not indexed yet surfaces as `NotFound`.
    async fn enable_pages(
        &self,
        repo: &RepositoryHandle,
        branch: &str,
        path: &str,
    ) -> Result<PagesActivation>;
}
