pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use client::GitHubClient;
pub use error::{GitHubError, Result};
pub use traits::{PagesActivation, PagesHost, RemoteFile, RepositoryStore};
pub use types::GitHubConfig;
