use thiserror::Error;

use super::types::SessionStatus;
use crate::collaborators::CollaboratorError;
use crate::types::SessionId;

/// Why a step action did not complete
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StepError {
    /// Collaborator hiccup; the step may be retried within its budget
    #[error("{0}")]
    Transient(String),

    /// Bad input or a rejected document; retrying cannot help
    #[error("{0}")]
    Terminal(String),
}

impl StepError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StepError::Transient(_))
    }
}

impl From<CollaboratorError> for StepError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::InvalidInput(_) => StepError::Terminal(err.to_string()),
            CollaboratorError::Unavailable(_) => StepError::Transient(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Subject {subject_id} already has an active onboarding session {session_id}")]
    DuplicateSession {
        subject_id: String,
        session_id: SessionId,
    },

    #[error("Invalid start request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Session {session_id} is {status} and accepts no further changes")]
    TerminalSession {
        session_id: SessionId,
        status: SessionStatus,
    },
}
