use std::sync::Arc;

use deploy_core::Attachment;
use openrouter::{ChatMessage, CompletionService};
use tracing::{debug, info};

use crate::error::{OrchestratorError, Result};
use crate::prompts::{ArtifactPrompts, SYSTEM_PROMPT};

const FENCE: &str = "```";

/// Produces the application source for one round of a job.
///
/// One request per call; the caller owns any retry policy since a second
/// generation is not the same artifact.
pub struct ArtifactGenerator {
    model: Arc<dyn CompletionService>,
}

impl ArtifactGenerator {
    pub fn new(model: Arc<dyn CompletionService>) -> Self {
        Self { model }
    }

    pub async fn generate(
        &self,
        brief: &str,
        checks: &[String],
        round: u32,
        existing_code: Option<&str>,
        attachments: &[Attachment],
    ) -> Result<String> {
        let prompt = match existing_code {
            Some(code) if round > 1 => {
                info!("Requesting revision of existing code for round {}", round);
                ArtifactPrompts::revision(code, brief, checks, attachments)
            }
            _ => {
                info!("Requesting new application for round {}", round);
                ArtifactPrompts::creation(brief, checks, attachments)
            }
        };

        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let raw = self.model.complete(messages).await?;
        debug!("Model returned {} bytes", raw.len());

        let code = strip_code_fences(&raw);
        if code.is_empty() {
            return Err(OrchestratorError::EmptyArtifact);
        }

        Ok(code)
    }
}

/// Remove markdown code-fence wrapping from a model response.
///
/// A leading fence line (with or without a language tag) and a trailing fence
/// marker are dropped, repeatedly, until neither remains. An opening fence with
/// no newline after it keeps whatever follows the marker.
pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();

    loop {
        let mut stripped = text;

        if let Some(rest) = stripped.strip_prefix(FENCE) {
            stripped = match rest.find('\n') {
                Some(newline) => &rest[newline + 1..],
                None => rest,
            };
        }

        if let Some(rest) = stripped.trim_end().strip_suffix(FENCE) {
            stripped = rest;
        }

        stripped = stripped.trim();
        if stripped.len() == text.len() {
            return stripped.to_string();
        }
        text = stripped;
    }
}
