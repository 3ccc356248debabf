use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

/// A generation request accepted at the HTTP boundary.
///
/// `round == 1` creates the artifact; any later round revises the one
/// published by the previous round.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Job {
    #[serde(rename = "task")]
    pub task_id: String,
    pub round: u32,
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<String>,
    pub email: String,
    pub nonce: String,
    pub evaluation_url: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Job {
    pub fn is_revision(&self) -> bool {
        self.round > 1
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.task_id.trim().is_empty() {
            return Err(CoreError::Validation("task cannot be empty".to_string()));
        }
        if self.round == 0 {
            return Err(CoreError::Validation("round must be at least 1".to_string()));
        }
        if self.evaluation_url.trim().is_empty() {
            return Err(CoreError::Validation(
                "evaluation_url cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A file handed to the generator as extra context, carried as a `data:` URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

impl Attachment {
    /// Decode the inline payload as UTF-8 text.
    pub fn decode(&self) -> Result<String, CoreError> {
        let (header, payload) = self
            .url
            .split_once(',')
            .ok_or_else(|| self.invalid("missing ',' separator"))?;

        let bytes = if header.ends_with(";base64") {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| self.invalid(e.to_string()))?
        } else {
            payload.as_bytes().to_vec()
        };

        String::from_utf8(bytes).map_err(|e| self.invalid(e.to_string()))
    }

    fn invalid(&self, reason: impl Into<String>) -> CoreError {
        CoreError::InvalidAttachment {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Progress of a single job through the deployment workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    ResolvingRepo,
    GeneratingCode,
    PublishingFiles,
    ActivatingPages,
    Notifying,
    Done,
    Aborted,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolvingRepo => "resolving_repo",
            Self::GeneratingCode => "generating_code",
            Self::PublishingFiles => "publishing_files",
            Self::ActivatingPages => "activating_pages",
            Self::Notifying => "notifying",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}
