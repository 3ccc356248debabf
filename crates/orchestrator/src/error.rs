use deploy_core::JobState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Repository {repo} does not exist, nothing to revise in round {round}")]
    RepositoryMissing { repo: String, round: u32 },

    #[error("GitHub error: {0}")]
    GitHub(#[from] github::GitHubError),

    #[error("Generation failed: {0}")]
    Generation(#[from] openrouter::OpenRouterError),

    #[error("Generated artifact is empty after removing code fences")]
    EmptyArtifact,

    #[error("Liveness probe failed: {0}")]
    Probe(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl OrchestratorError {
    pub fn invalid_transition(from: JobState, to: JobState) -> Self {
        Self::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
