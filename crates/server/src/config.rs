use std::path::{Path, PathBuf};
use std::time::Duration;

use deploy_core::{RepoNaming, DEFAULT_REPO_PREFIX};
use github::types::{DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS};
use github::GitHubConfig;
use openrouter::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use orchestrator::WorkflowConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "pages-deployer.toml";
pub const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Shared secret every job submission must carry.
    #[serde(skip_serializing)]
    pub secret: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSection {
    #[serde(skip_serializing)]
    pub token: String,
    pub owner: String,
    pub api_base: String,
    pub repo_prefix: String,
    pub naming: RepoNaming,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            repo_prefix: DEFAULT_REPO_PREFIX.to_string(),
            naming: RepoNaming::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSection {
    pub backoff_unit_ms: u64,
    pub http_timeout_secs: u64,
    pub pages_enable_attempts: u32,
    pub pages_verify_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_verify_interval_secs: Option<u64>,
    pub notify_attempts: u32,
}

impl Default for WorkflowSection {
    fn default() -> Self {
        let defaults = WorkflowConfig::default();
        Self {
            backoff_unit_ms: defaults.backoff_unit.as_millis() as u64,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            pages_enable_attempts: defaults.pages_enable_attempts,
            pages_verify_attempts: defaults.pages_verify_attempts,
            pages_verify_interval_secs: None,
            notify_attempts: defaults.notify_attempts,
        }
    }
}

/// Service settings, built once at startup and handed to every component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub github: GitHubSection,
    pub llm: LlmSection,
    pub workflow: WorkflowSection,
}

impl ServiceConfig {
    /// Read `.env`, then the TOML file at `path` if it exists, then apply
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "Loaded .env file");
        }

        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Overlay values found through `lookup`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(secret) = var("MY_SECRET") {
            self.server.secret = secret;
        }
        if let Some(port) = var("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: port,
            })?;
        }
        if let Some(token) = var("GITHUB_TOKEN") {
            self.github.token = token;
        }
        if let Some(owner) = var("GITHUB_USERNAME") {
            self.github.owner = owner;
        }
        if let Some(prefix) = var("REPO_PREFIX") {
            self.github.repo_prefix = prefix;
        }
        if let Some(api_key) = var("OPENROUTER_API_KEY") {
            self.llm.api_key = api_key;
        }
        if let Some(model) = var("OPENROUTER_MODEL") {
            self.llm.model = model;
        }
        if let Some(base_url) = var("OPENROUTER_BASE_URL") {
            self.llm.base_url = base_url;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("MY_SECRET", &self.server.secret),
            ("GITHUB_TOKEN", &self.github.token),
            ("GITHUB_USERNAME", &self.github.owner),
            ("OPENROUTER_API_KEY", &self.llm.api_key),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.workflow.http_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    pub fn github_config(&self) -> GitHubConfig {
        GitHubConfig::new(&self.github.owner)
            .with_api_base(&self.github.api_base)
            .with_timeout(self.http_timeout())
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        let workflow = &self.workflow;
        WorkflowConfig {
            repo_prefix: self.github.repo_prefix.clone(),
            naming: self.github.naming,
            backoff_unit: Duration::from_millis(workflow.backoff_unit_ms),
            pages_enable_attempts: workflow.pages_enable_attempts,
            pages_verify_attempts: workflow.pages_verify_attempts,
            pages_verify_interval: workflow.pages_verify_interval_secs.map(Duration::from_secs),
            notify_attempts: workflow.notify_attempts,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
