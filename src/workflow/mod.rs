// Onboarding session workflow: the step graph, signature lifecycle and orchestrator

pub mod errors;
pub mod orchestrator;
pub mod signatures;
pub mod steps;
pub mod types;

pub use errors::{OrchestratorError, StepError};
pub use orchestrator::{AdvanceOutcome, CallbackOutcome, WorkflowOrchestrator, WorkflowSettings};
pub use signatures::{CallbackEffect, SignatureCheck, SignatureSettings};
pub use types::{
    Cancellation, DocumentType, SessionStatus, SignatureOutcome, SignatureRequest, SignatureStatus,
    SignatureWebhook, SignedArtifact, StepKind, StepStatus, SystemAccessGrant, TrainingCompletion,
    TrainingRequirementSet, TrainingUpdate, WorkflowSession, WorkflowStep,
};
