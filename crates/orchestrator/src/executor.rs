use std::sync::Arc;
use std::time::Duration;

use deploy_core::{
    Job, JobState, NotificationPayload, PagesDeployment, RepoNaming, RepositoryHandle,
    DEFAULT_REPO_PREFIX,
};
use github::{PagesHost, RepositoryStore};
use openrouter::CompletionService;
use serde::Serialize;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::backoff::Backoff;
use crate::error::Result;
use crate::generator::ArtifactGenerator;
use crate::notifier::{EvaluationNotifier, EvaluationSink};
use crate::pages::{PagesActivator, SiteProbe};
use crate::publisher::{RepositoryPublisher, INDEX_PATH};
use crate::state_machine::JobStateMachine;

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub repo_prefix: String,
    pub naming: RepoNaming,
    /// Base wait of every exponential schedule.
    pub backoff_unit: Duration,
    pub pages_enable_attempts: u32,
    pub pages_verify_attempts: u32,
    /// Poll liveness at this fixed interval instead of exponentially.
    pub pages_verify_interval: Option<Duration>,
    pub notify_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            repo_prefix: DEFAULT_REPO_PREFIX.to_string(),
            naming: RepoNaming::InPlace,
            backoff_unit: Duration::from_secs(1),
            pages_enable_attempts: 6,
            pages_verify_attempts: 8,
            pages_verify_interval: None,
            notify_attempts: 5,
        }
    }
}

impl WorkflowConfig {
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_naming(mut self, naming: RepoNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_repo_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.repo_prefix = prefix.into();
        self
    }

    fn verify_backoff(&self) -> Backoff {
        match self.pages_verify_interval {
            Some(interval) => Backoff::fixed(self.pages_verify_attempts, interval),
            None => Backoff::exponential(self.pages_verify_attempts, self.backoff_unit),
        }
    }
}

/// External platforms the workflow talks to.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn RepositoryStore>,
    pub pages: Arc<dyn PagesHost>,
    pub model: Arc<dyn CompletionService>,
    pub probe: Arc<dyn SiteProbe>,
    pub sink: Arc<dyn EvaluationSink>,
}

/// What happened to a job, for logs and tests.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: Uuid,
    pub task: String,
    pub round: u32,
    pub final_state: JobState,
    pub repository: Option<RepositoryHandle>,
    pub pages: Option<PagesDeployment>,
    pub commit_sha: Option<String>,
    pub notified: bool,
    pub error: Option<String>,
}

impl JobReport {
    fn new(job_id: Uuid, job: &Job) -> Self {
        Self {
            job_id,
            task: job.task_id.clone(),
            round: job.round,
            final_state: JobState::ResolvingRepo,
            repository: None,
            pages: None,
            commit_sha: None,
            notified: false,
            error: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.final_state == JobState::Done
    }
}

/// Drives one job from repository resolution to evaluator notification.
pub struct TaskOrchestrator {
    publisher: RepositoryPublisher,
    generator: ArtifactGenerator,
    pages: PagesActivator,
    notifier: EvaluationNotifier,
}

impl TaskOrchestrator {
    pub fn new(services: Services, config: WorkflowConfig) -> Self {
        let publisher = RepositoryPublisher::new(
            services.store,
            config.repo_prefix.clone(),
            config.naming,
        );
        let generator = ArtifactGenerator::new(services.model);
        let pages = PagesActivator::new(
            services.pages,
            services.probe,
            Backoff::exponential(config.pages_enable_attempts, config.backoff_unit),
            config.verify_backoff(),
        );
        let notifier = EvaluationNotifier::new(
            services.sink,
            Backoff::exponential(config.notify_attempts, config.backoff_unit),
        );

        Self {
            publisher,
            generator,
            pages,
            notifier,
        }
    }

    /// Run the whole workflow. Failures end in [`JobState::Aborted`] and are
    /// reported, never raised; the evaluator is only notified on success.
    pub async fn run(&self, job: Job) -> JobReport {
        let job_id = Uuid::new_v4();
        let span = tracing::info_span!("job", %job_id, task = %job.task_id, round = job.round);

        async move {
            info!("Job started");
            let mut report = JobReport::new(job_id, &job);

            match self.drive(&job, &mut report).await {
                Ok(()) => info!(
                    live = report.pages.as_ref().is_some_and(PagesDeployment::is_live),
                    notified = report.notified,
                    "Job finished"
                ),
                Err(e) => {
                    error!(state = report.final_state.as_str(), "Job aborted: {}", e);
                    report.error = Some(e.to_string());
                    if let Err(transition) = self.advance(&mut report, JobState::Aborted) {
                        error!("{}", transition);
                    }
                }
            }

            report
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, job: &Job, report: &mut JobReport) -> Result<()> {
        let repo = self
            .publisher
            .ensure_repository(&job.task_id, job.round)
            .await?;
        report.repository = Some(repo.clone());

        self.advance(report, JobState::GeneratingCode)?;
        let existing_code = if job.is_revision() {
            let code = self.publisher.read_file(&repo, INDEX_PATH).await?;
            if code.is_none() {
                warn!(
                    "{} not found in {}, generating from scratch",
                    INDEX_PATH,
                    repo.full_name()
                );
            }
            code
        } else {
            None
        };

        let code = self
            .generator
            .generate(
                &job.brief,
                &job.checks,
                job.round,
                existing_code.as_deref(),
                &job.attachments,
            )
            .await?;

        self.advance(report, JobState::PublishingFiles)?;
        let commit_sha = self.publisher.publish_files(&repo, job, &code).await?;
        report.commit_sha = Some(commit_sha.clone());

        self.advance(report, JobState::ActivatingPages)?;
        let deployment = self.pages.publish_and_verify(&repo).await;
        let pages_url = deployment.url.clone();
        report.pages = Some(deployment);

        self.advance(report, JobState::Notifying)?;
        let payload = NotificationPayload::new(job, &repo, commit_sha, pages_url);
        report.notified = self.notifier.notify(&job.evaluation_url, &payload).await;

        self.advance(report, JobState::Done)
    }

    fn advance(&self, report: &mut JobReport, to: JobState) -> Result<()> {
        JobStateMachine::validate_transition(&report.final_state, &to)?;
        info!("{} -> {}", report.final_state.as_str(), to.as_str());
        report.final_state = to;
        Ok(())
    }
}
