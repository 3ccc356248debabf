use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deploy_core::NotificationPayload;
use reqwest::Client;
use tracing::{error, info};

use crate::backoff::Backoff;
use crate::error::{OrchestratorError, Result};

/// Destination for completion notifications.
#[async_trait]
pub trait EvaluationSink: Send + Sync {
    async fn deliver(&self, url: &str, payload: &NotificationPayload) -> Result<()>;
}

/// Posts the payload as JSON; any 2xx response counts as delivered.
pub struct HttpEvaluationSink {
    client: Client,
}

impl HttpEvaluationSink {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EvaluationSink for HttpEvaluationSink {
    async fn deliver(&self, url: &str, payload: &NotificationPayload) -> Result<()> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| OrchestratorError::Delivery(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(OrchestratorError::Delivery(format!(
                "evaluator answered HTTP {}",
                status.as_u16()
            )))
        }
    }
}

pub struct EvaluationNotifier {
    sink: Arc<dyn EvaluationSink>,
    backoff: Backoff,
}

impl EvaluationNotifier {
    pub fn new(sink: Arc<dyn EvaluationSink>, backoff: Backoff) -> Self {
        Self { sink, backoff }
    }

    /// Best effort: returns whether the evaluator acknowledged the payload.
    pub async fn notify(&self, url: &str, payload: &NotificationPayload) -> bool {
        info!("Notifying evaluation server at {}", url);

        let sink = &self.sink;
        let outcome = self
            .backoff
            .run("notify evaluator", move |_| sink.deliver(url, payload))
            .await;

        if outcome.is_success() {
            info!("Notification delivered for task {}", payload.task);
            true
        } else {
            error!(
                "Giving up on notification for task {} after {} attempts",
                payload.task,
                outcome.attempts()
            );
            false
        }
    }
}
