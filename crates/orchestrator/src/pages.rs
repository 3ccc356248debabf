use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deploy_core::{PagesDeployment, PagesStatus, RepositoryHandle, PAGES_SOURCE_PATH};
use github::{GitHubError, PagesActivation, PagesHost};
use reqwest::Client;
use tracing::{info, warn};

use crate::backoff::{Backoff, RetryOutcome};
use crate::error::{OrchestratorError, Result};

/// Checks whether a published URL is being served.
#[async_trait]
pub trait SiteProbe: Send + Sync {
    /// HTTP status returned for `url`.
    async fn probe(&self, url: &str) -> Result<u16>;
}

/// `HEAD` request probe.
pub struct HttpSiteProbe {
    client: Client,
}

impl HttpSiteProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SiteProbe for HttpSiteProbe {
    async fn probe(&self, url: &str) -> Result<u16> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| OrchestratorError::Probe(e.to_string()))?;

        Ok(response.status().as_u16())
    }
}

/// Enables static hosting and waits, within a bounded budget, for the site
/// to come up.
pub struct PagesActivator {
    host: Arc<dyn PagesHost>,
    probe: Arc<dyn SiteProbe>,
    enable: Backoff,
    verify: Backoff,
}

impl PagesActivator {
    pub fn new(
        host: Arc<dyn PagesHost>,
        probe: Arc<dyn SiteProbe>,
        enable: Backoff,
        verify: Backoff,
    ) -> Self {
        Self {
            host,
            probe,
            enable,
            verify,
        }
    }

    /// Never fails: a site that cannot be confirmed is returned as
    /// [`PagesStatus::Unconfirmed`].
    pub async fn publish_and_verify(&self, repo: &RepositoryHandle) -> PagesDeployment {
        let deployment = PagesDeployment::requested(repo);
        info!("Enabling Pages for {}", deployment.repository);

        let host = &self.host;
        let outcome = self
            .enable
            .run_classified(
                "enable pages",
                move |_| host.enable_pages(repo, &repo.default_branch, PAGES_SOURCE_PATH),
                is_indexing_delay,
            )
            .await;

        match outcome {
            RetryOutcome::Succeeded {
                value: PagesActivation::AlreadyEnabled,
                ..
            } => info!("Pages already enabled for {}", deployment.repository),
            RetryOutcome::Succeeded { .. } => info!("Pages enabled for {}", deployment.repository),
            RetryOutcome::Exhausted { last_error, .. } => {
                warn!("Pages could not be enabled: {}", last_error)
            }
            RetryOutcome::Aborted { error, .. } => {
                warn!("Pages enable rejected: {}", error)
            }
        }

        let deployment = deployment.with_status(PagesStatus::Pending);
        info!("Verifying deployment at {}", deployment.url);

        let probe = &self.probe;
        let url = deployment.url.as_str();
        let verified = self
            .verify
            .run("verify pages", move |_| async move {
                match probe.probe(url).await {
                    Ok(status) if (200..300).contains(&status) => Ok(()),
                    Ok(status) => Err(OrchestratorError::Probe(format!("HTTP {}", status))),
                    Err(e) => Err(e),
                }
            })
            .await;

        if verified.is_success() {
            info!("Site is live at {}", deployment.url);
            deployment.with_status(PagesStatus::Live)
        } else {
            warn!(
                "Pages URL {} could not be verified after {} probes, proceeding",
                deployment.url,
                verified.attempts()
            );
            deployment.with_status(PagesStatus::Unconfirmed)
        }
    }
}

/// Not-found means the hosting subsystem has not seen the repository yet.
/// Any other definitive answer from the API ends the enable step.
fn is_indexing_delay(err: &GitHubError) -> bool {
    matches!(
        err,
        GitHubError::NotFound(_)
            | GitHubError::RepoNotFound { .. }
            | GitHubError::Network(_)
            | GitHubError::Timeout(_)
    )
}
