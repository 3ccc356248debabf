use deploy_core::JobState;

use crate::error::{OrchestratorError, Result};

pub struct JobStateMachine;

impl JobStateMachine {
    pub fn validate_transition(from: &JobState, to: &JobState) -> Result<()> {
        let allowed = Self::allowed_transitions(from);

        if allowed.contains(to) {
            Ok(())
        } else {
            Err(OrchestratorError::invalid_transition(*from, *to))
        }
    }

    fn allowed_transitions(from: &JobState) -> Vec<JobState> {
        match from {
            JobState::ResolvingRepo => vec![JobState::GeneratingCode, JobState::Aborted],
            JobState::GeneratingCode => vec![JobState::PublishingFiles, JobState::Aborted],
            JobState::PublishingFiles => vec![JobState::ActivatingPages, JobState::Aborted],
            JobState::ActivatingPages => vec![JobState::Notifying, JobState::Aborted],
            JobState::Notifying => vec![JobState::Done, JobState::Aborted],
            JobState::Done | JobState::Aborted => vec![],
        }
    }

    pub fn can_transition(from: &JobState, to: &JobState) -> bool {
        Self::validate_transition(from, to).is_ok()
    }

    pub fn next_state(current: &JobState) -> Option<JobState> {
        match current {
            JobState::ResolvingRepo => Some(JobState::GeneratingCode),
            JobState::GeneratingCode => Some(JobState::PublishingFiles),
            JobState::PublishingFiles => Some(JobState::ActivatingPages),
            JobState::ActivatingPages => Some(JobState::Notifying),
            JobState::Notifying => Some(JobState::Done),
            JobState::Done | JobState::Aborted => None,
        }
    }
}
