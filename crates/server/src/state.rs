use std::sync::Arc;

use orchestrator::TaskOrchestrator;
use sha2::{Digest, Sha256};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TaskOrchestrator>,
    secret_digest: [u8; 32],
}

impl AppState {
    pub fn new(orchestrator: Arc<TaskOrchestrator>, secret: &str) -> Self {
        Self {
            orchestrator,
            secret_digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    /// Compares digests so the comparison does not depend on the secret's length.
    pub fn secret_matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        candidate
            .iter()
            .zip(self.secret_digest.iter())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

