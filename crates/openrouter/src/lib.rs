//! OpenRouter API client for chat completions

pub mod client;
pub mod error;
pub mod types;

pub use client::{CompletionService, OpenRouterClient};
pub use error::{OpenRouterError, Result};
pub use types::*;
