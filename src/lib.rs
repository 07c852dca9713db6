// Contractor onboarding workflow engine
// Trigger dispatch, dependency-gated onboarding sessions, signature and training callbacks

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod workflow;

// Re-export key types for easy access
pub use collaborators::{CollaboratorError, Collaborators, Notifier, SubjectIdentifiers};
pub use config::{config, init_config, OnboardingConfig};
pub use dispatch::{DispatchPolicy, DispatchStatistics, TriggerDispatcher, TriggerLog, TriggerOutcome};
pub use store::{PersistenceError, SessionStore, StoreSnapshot, TriggerLogStore};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use types::{
    ContractorRole, Notification, NotificationChannel, SessionId, SignatureId, SubjectProfile,
    TriggerEvent, TriggerSource,
};
pub use workflow::{
    AdvanceOutcome, CallbackOutcome, OrchestratorError, SessionStatus, StepKind, StepStatus,
    WorkflowOrchestrator, WorkflowSession, WorkflowSettings,
};
