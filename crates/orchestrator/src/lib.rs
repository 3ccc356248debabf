pub mod backoff;
pub mod error;
pub mod executor;
pub mod generator;
pub mod notifier;
pub mod pages;
pub mod prompts;
pub mod publisher;
pub mod state_machine;

pub use backoff::{Backoff, RetryOutcome, Schedule};
pub use error::{OrchestratorError, Result};
pub use executor::{JobReport, Services, TaskOrchestrator, WorkflowConfig};
pub use generator::{strip_code_fences, ArtifactGenerator};
pub use notifier::{EvaluationNotifier, EvaluationSink, HttpEvaluationSink};
pub use pages::{HttpSiteProbe, PagesActivator, SiteProbe};
pub use publisher::RepositoryPublisher;
pub use state_machine::JobStateMachine;
