use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenRouterError {
    #[error("OpenRouter API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("OpenRouter rate limited, retry after {retry_after:?}s")]
    RateLimited { retry_after: Option<u64> },

    #[error("Completion request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No completion returned")]
    EmptyCompletion,
}

/// Result type alias for OpenRouter operations
pub type Result<T> = std::result::Result<T, OpenRouterError>;
