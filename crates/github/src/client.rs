use std::future::Future;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use deploy_core::{FileArtifact, RepositoryHandle, DEFAULT_BRANCH};
use octocrab::Octocrab;
use tracing::{debug, info};

use crate::error::{GitHubError, Result};
use crate::traits::{PagesActivation, PagesHost, RemoteFile, RepositoryStore};
use crate::types::{
    BlobResponse, BranchResponse, ContentResponse, CreateRepoRequest, GitHubConfig, PagesRequest, PagesSource,
    PutFileRequest, PutFileResponse, RefQuery, RepoResponse,
};

pub struct GitHubClient {
    octocrab: Octocrab,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(token: &str, config: GitHubConfig) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(config.api_base.as_str())
            .map_err(|e| GitHubError::Config(e.to_string()))?
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self { octocrab, config })
    }

    async fn timed<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = octocrab::Result<T>>,
    {
        tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| GitHubError::Timeout(self.config.timeout.as_secs()))?
            .map_err(GitHubError::from)
    }

    fn repo_route(&self, repo: &RepositoryHandle, suffix: &str) -> String {
        format!("/repos/{}/{}/{}", repo.owner, repo.name, suffix)
    }

    fn convert_repo(&self, repo: RepoResponse) -> RepositoryHandle {
        RepositoryHandle {
            owner: repo.owner.login,
            name: repo.name,
            default_branch: repo.default_branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            html_url: repo.html_url,
        }
    }

    /// Decode a contents or blobs API body. The contents API wraps base64 at
    /// 60 columns.
    fn decode_body(&self, raw: Option<String>, encoding: Option<&str>) -> Result<String> {
        let raw = raw.unwrap_or_default();
        match encoding {
            Some("base64") | None => {
                let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = STANDARD
                    .decode(compact)
                    .map_err(|e| GitHubError::Decode(e.to_string()))?;
                String::from_utf8(bytes).map_err(|e| GitHubError::Decode(e.to_string()))
            }
            Some(_) => Ok(raw),
        }
    }

    /// Files above 1 MB come back from the contents API with encoding `none`
    /// and no body; those are read through the blobs API instead.
    async fn read_content(&self, repo: &RepositoryHandle, file: ContentResponse) -> Result<RemoteFile> {
        let content = match file.encoding.as_deref() {
            Some("base64") | None => self.decode_body(file.content, file.encoding.as_deref())?,
            Some(encoding) => {
                debug!(
                    "{} returned with encoding {}, reading blob {}",
                    file.path, encoding, file.sha
                );
                let route = self.repo_route(repo, &format!("git/blobs/{}", file.sha));
                let blob: BlobResponse = self
                    .timed(self.octocrab.get(route, None::<&()>))
                    .await?;
                self.decode_body(blob.content, blob.encoding.as_deref())?
            }
        };

        Ok(RemoteFile {
            path: file.path,
            sha: file.sha,
            content,
        })
    }

    async fn put_file(
        &self,
        repo: &RepositoryHandle,
        artifact: &FileArtifact,
        sha: Option<&str>,
    ) -> Result<String> {
        let request = PutFileRequest {
            message: &artifact.message,
            content: STANDARD.encode(artifact.content.as_bytes()),
            branch: &repo.default_branch,
            sha,
        };
        let route = self.repo_route(repo, &format!("contents/{}", artifact.path));

        let response: PutFileResponse = self
            .timed(self.octocrab.put(route, Some(&request)))
            .await?;

        Ok(response.commit.sha)
    }
}

#[async_trait]
impl RepositoryStore for GitHubClient {
    async fn create_repository(&self, name: &str, description: &str) -> Result<RepositoryHandle> {
        info!("Creating repository {}/{}", self.config.owner, name);

        let request = CreateRepoRequest {
            name,
            description,
            private: false,
            auto_init: false,
        };
        let repo: RepoResponse = self
            .timed(self.octocrab.post("/user/repos", Some(&request)))
            .await?;

        Ok(self.convert_repo(repo))
    }

    async fn get_repository(&self, name: &str) -> Result<RepositoryHandle> {
        debug!("Getting repository {}/{}", self.config.owner, name);

        let route = format!("/repos/{}/{}", self.config.owner, name);
        let result: Result<RepoResponse> = self
            .timed(self.octocrab.get(route, None::<&()>))
            .await;

        match result {
            Ok(repo) => Ok(self.convert_repo(repo)),
            Err(e) if e.is_not_found() => Err(GitHubError::RepoNotFound {
                owner: self.config.owner.clone(),
                repo: name.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn get_file(&self, repo: &RepositoryHandle, path: &str) -> Result<Option<RemoteFile>> {
        debug!("Getting {} from {}", path, repo.full_name());

        let route = self.repo_route(repo, &format!("contents/{}", path));
        let query = RefQuery {
            git_ref: &repo.default_branch,
        };
        let result: Result<ContentResponse> = self
            .timed(self.octocrab.get(route, Some(&query)))
            .await;

        match result {
            Ok(file) => self.read_content(repo, file).await.map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_file(&self, repo: &RepositoryHandle, artifact: &FileArtifact) -> Result<String> {
        info!("Creating {} in {}", artifact.path, repo.full_name());
        self.put_file(repo, artifact, None).await
    }

    async fn update_file(
        &self,
        repo: &RepositoryHandle,
        artifact: &FileArtifact,
        sha: &str,
    ) -> Result<String> {
        info!("Updating {} in {}", artifact.path, repo.full_name());
        self.put_file(repo, artifact, Some(sha)).await
    }

    async fn latest_commit(&self, repo: &RepositoryHandle, branch: &str) -> Result<String> {
        let route = self.repo_route(repo, &format!("branches/{}", branch));
        let response: BranchResponse = self
            .timed(self.octocrab.get(route, None::<&()>))
            .await?;

        Ok(response.commit.sha)
    }
}

#[async_trait]
impl PagesHost for GitHubClient {
    async fn enable_pages(
        &self,
        repo: &RepositoryHandle,
        branch: &str,
        path: &str,
    ) -> Result<PagesActivation> {
        let request = PagesRequest {
            source: PagesSource { branch, path },
        };
        let route = self.repo_route(repo, "pages");

        let result: Result<serde_json::Value> = self
            .timed(self.octocrab.post(route, Some(&request)))
            .await;

        match result {
            Ok(_) => Ok(PagesActivation::Enabled),
            Err(GitHubError::Conflict(_)) => Ok(PagesActivation::AlreadyEnabled),
            Err(e) => Err(e),
        }
    }
}
