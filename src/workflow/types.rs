use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::collaborators::SubjectIdentifiers;
use crate::types::{Notification, SessionId, SignatureId, TriggerEvent};

/// The eight onboarding steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    UserVerification,
    DocumentGeneration,
    SignatureRequest,
    SignatureValidation,
    SectionAccessCreation,
    TrainingAssignment,
    /// Training gate: waits for the external training-completion signal
    AccessPending,
    FullAccessGrant,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::UserVerification => "user_verification",
            StepKind::DocumentGeneration => "document_generation",
            StepKind::SignatureRequest => "signature_request",
            StepKind::SignatureValidation => "signature_validation",
            StepKind::SectionAccessCreation => "section_access_creation",
            StepKind::TrainingAssignment => "training_assignment",
            StepKind::AccessPending => "access_pending",
            StepKind::FullAccessGrant => "full_access_grant",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    /// Completed or skipped steps are never examined again
    pub fn is_done(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: StepKind,
    pub name: String,
    pub description: String,
    pub order: u8,
    pub dependencies: Vec<StepKind>,
    pub automated: bool,
    pub status: StepStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    /// Step-local data handed to later steps (e.g. rendered documents)
    pub data: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ContractorAgreement,
    Nda,
    W9,
    InsuranceCert,
}

impl DocumentType {
    /// Documents that must be signed before access is created
    pub const REQUIRED: [DocumentType; 2] = [DocumentType::ContractorAgreement, DocumentType::Nda];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::ContractorAgreement => "contractor_agreement",
            DocumentType::Nda => "nda",
            DocumentType::W9 => "w9",
            DocumentType::InsuranceCert => "insurance_cert",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    Pending,
    Sent,
    Signed,
    Declined,
    Expired,
    Cancelled,
}

impl SignatureStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            SignatureStatus::Signed
                | SignatureStatus::Declined
                | SignatureStatus::Expired
                | SignatureStatus::Cancelled
        )
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, SignatureStatus::Declined | SignatureStatus::Expired)
    }
}

/// Outcome reported by the signature vendor webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureOutcome {
    Signed,
    Declined,
    Expired,
}

impl SignatureOutcome {
    pub fn status(&self) -> SignatureStatus {
        match self {
            SignatureOutcome::Signed => SignatureStatus::Signed,
            SignatureOutcome::Declined => SignatureStatus::Declined,
            SignatureOutcome::Expired => SignatureStatus::Expired,
        }
    }
}

/// Evidence captured by the vendor when a document is signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedArtifact {
    pub signature_blob: String,
    pub timestamp: DateTime<Utc>,
    pub device_info: String,
    pub ip_address: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureRequest {
    pub id: SignatureId,
    pub session_id: SessionId,
    pub subject_id: String,
    pub document_type: DocumentType,
    pub document_content: String,
    pub signature_url: String,
    pub token: String,
    pub status: SignatureStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub signed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub reminders_sent: u32,
    pub last_reminder_at: Option<DateTime<Utc>>,
    pub signed_artifact: Option<SignedArtifact>,
}

/// Inbound signature webhook payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureWebhook {
    pub signature_request_id: SignatureId,
    pub subject_id: String,
    pub document_type: DocumentType,
    pub outcome: SignatureOutcome,
    #[serde(default)]
    pub signed_artifact: Option<SignedArtifact>,
}

/// Inbound training-completion callback payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingCompletion {
    pub subject_id: String,
    pub module_id: String,
}

/// What happened when a module completion was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingUpdate {
    Recorded,
    AlreadyCompleted,
    NotAssigned,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRequirementSet {
    pub required: Vec<String>,
    pub completed: Vec<String>,
    pub in_progress: Vec<String>,
    pub all_completed: bool,
}

impl TrainingRequirementSet {
    pub fn new(required: Vec<String>) -> Self {
        let mut set = Self {
            required,
            ..Default::default()
        };
        set.recompute();
        set
    }

    /// Mark every required module that is not yet completed as in progress
    pub fn assign(&mut self, required: Vec<String>) {
        self.required = required;
        self.in_progress = self
            .required
            .iter()
            .filter(|module| !self.completed.contains(*module))
            .cloned()
            .collect();
        self.recompute();
    }

    pub fn complete(&mut self, module_id: &str) -> TrainingUpdate {
        if self.completed.iter().any(|m| m == module_id) {
            return TrainingUpdate::AlreadyCompleted;
        }
        let Some(position) = self.in_progress.iter().position(|m| m == module_id) else {
            return TrainingUpdate::NotAssigned;
        };
        let module = self.in_progress.remove(position);
        self.completed.push(module);
        self.recompute();
        TrainingUpdate::Recorded
    }

    /// `all_completed` holds iff required is a subset of completed
    pub fn recompute(&mut self) -> bool {
        self.all_completed = self
            .required
            .iter()
            .all(|module| self.completed.contains(module));
        self.all_completed
    }

    pub fn remaining(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|module| !self.completed.contains(*module))
            .map(String::as_str)
            .collect()
    }
}

pub const RESTRICTION_PENDING_AGREEMENT: &str = "pending_contractor_agreement";
pub const RESTRICTION_PENDING_TRAINING: &str = "pending_training";
pub const RESTRICTION_TRAINING_REQUIRED: &str = "training_required";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemAccessGrant {
    pub sections: Vec<String>,
    pub granted: bool,
    pub restrictions: Vec<String>,
    pub granted_at: Option<DateTime<Utc>>,
    pub full_access_at: Option<DateTime<Utc>>,
}

impl Default for SystemAccessGrant {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            granted: false,
            restrictions: vec![
                RESTRICTION_PENDING_AGREEMENT.to_string(),
                RESTRICTION_PENDING_TRAINING.to_string(),
            ],
            granted_at: None,
            full_access_at: None,
        }
    }
}

impl SystemAccessGrant {
    pub fn grant_initial(&mut self, sections: Vec<String>, now: DateTime<Utc>) {
        self.sections = sections;
        self.granted = true;
        self.granted_at = Some(now);
        self.restrictions = vec![RESTRICTION_TRAINING_REQUIRED.to_string()];
    }

    pub fn grant_full(&mut self, sections: Vec<String>, now: DateTime<Utc>) {
        self.sections = sections;
        self.granted = true;
        self.granted_at.get_or_insert(now);
        self.full_access_at = Some(now);
        self.restrictions.clear();
    }

    pub fn is_restricted(&self) -> bool {
        !self.restrictions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub cancelled_by: String,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

/// Aggregate root for one contractor's onboarding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSession {
    pub id: SessionId,
    pub trigger: TriggerEvent,
    pub identifiers: Option<SubjectIdentifiers>,
    pub status: SessionStatus,
    pub steps: Vec<WorkflowStep>,
    pub signature_requests: Vec<SignatureRequest>,
    pub system_access: SystemAccessGrant,
    pub training: TrainingRequirementSet,
    pub notifications: Vec<Notification>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancellation: Option<Cancellation>,
}

impl WorkflowSession {
    pub fn subject_id(&self) -> &str {
        &self.trigger.subject.user_id
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn step(&self, kind: StepKind) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == kind)
    }

    pub fn step_mut(&mut self, kind: StepKind) -> Option<&mut WorkflowStep> {
        self.steps.iter_mut().find(|s| s.id == kind)
    }

    pub fn step_status(&self, kind: StepKind) -> Option<StepStatus> {
        self.step(kind).map(|s| s.status)
    }

    /// First step, in order, that is neither completed nor skipped
    pub fn current_step(&self) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| !s.status.is_done())
    }

    pub fn dependencies_met(&self, step: &WorkflowStep) -> bool {
        step.dependencies
            .iter()
            .all(|dep| self.step_status(*dep) == Some(StepStatus::Completed))
    }

    pub fn all_steps_completed(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }

    pub fn signature(&self, id: &SignatureId) -> Option<&SignatureRequest> {
        self.signature_requests.iter().find(|r| &r.id == id)
    }

    pub fn signature_mut(&mut self, id: &SignatureId) -> Option<&mut SignatureRequest> {
        self.signature_requests.iter_mut().find(|r| &r.id == id)
    }

    /// Latest request per required document type
    pub fn required_signatures(&self) -> Vec<&SignatureRequest> {
        DocumentType::REQUIRED
            .iter()
            .filter_map(|doc| {
                self.signature_requests
                    .iter()
                    .rev()
                    .find(|r| r.document_type == *doc)
            })
            .collect()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }
}
