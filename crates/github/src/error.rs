use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Repository not found: {owner}/{repo}")]
    RepoNotFound { owner: String, repo: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimitExceeded { reset_at: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl GitHubError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitHubError::NotFound(_) | GitHubError::RepoNotFound { .. }
        )
    }
}

impl From<octocrab::Error> for GitHubError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                let message = source.message.clone();
                let details = source
                    .errors
                    .as_ref()
                    .map(|errors| format!("{:?}", errors))
                    .unwrap_or_default();

                match status {
                    401 => GitHubError::Authentication(message),
                    404 => GitHubError::NotFound(message),
                    409 => GitHubError::Conflict(message),
                    403 if message.contains("rate limit") => GitHubError::RateLimitExceeded {
                        reset_at: "unknown".to_string(),
                    },
                    422 if message.contains("already exists")
                        || details.contains("already exists") =>
                    {
                        GitHubError::AlreadyExists(message)
                    }
                    _ => GitHubError::Api { status, message },
                }
            }
            octocrab::Error::Serde { .. } | octocrab::Error::Json { .. } => {
                GitHubError::Decode(err.to_string())
            }
            _ => GitHubError::Network(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;
