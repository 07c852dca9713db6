use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument};

use super::errors::{OrchestratorError, StepError};
use super::signatures::{self, CallbackEffect, SignatureCheck, SignatureSettings};
use super::steps::standard_steps;
use super::types::*;
use crate::collaborators::{Collaborators, IdentityRequest, Notifier, SubjectIdentifiers};
use crate::config::OnboardingConfig;
use crate::store::{SessionHandle, SessionStore};
use crate::telemetry::create_workflow_span;
use crate::types::{ContractorRole, NotificationChannel, SessionId, SignatureId, TriggerEvent};

/// Tunables for the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    /// Suggested delay before a caller re-invokes `advance` after a retryable failure
    pub retry_backoff: Duration,
    pub signatures: SignatureSettings,
    pub admin_recipients: Vec<String>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            retry_backoff: Duration::from_secs(5),
            signatures: SignatureSettings::default(),
            admin_recipients: vec!["onboarding-admins".to_string()],
        }
    }
}

impl WorkflowSettings {
    pub fn from_config(config: &OnboardingConfig) -> Self {
        Self {
            retry_backoff: Duration::from_secs(config.workflow.retry_backoff_seconds),
            signatures: SignatureSettings {
                base_url: config.workflow.signature_base_url.clone(),
                expiry: chrono::Duration::days(config.workflow.signature_expiry_days),
                reminder_days: config.workflow.reminder_days.clone(),
                max_reminders: config.workflow.max_reminders,
            },
            admin_recipients: config.dispatcher.admin_recipients.clone(),
        }
    }
}

/// Where a session stands after an advance
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Completed,
    /// Waiting on a dependency or an external signal
    Blocked { step: StepKind },
    /// The step reverted to pending; call `advance` again after `backoff`
    RetryScheduled {
        step: StepKind,
        attempt: u32,
        backoff: Duration,
    },
    Failed { step: StepKind, reason: String },
    Cancelled,
}

/// Result of applying an external callback. Callbacks never raise.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    Applied {
        session_id: SessionId,
        progress: AdvanceOutcome,
    },
    Duplicate {
        session_id: SessionId,
    },
    Ignored {
        session_id: SessionId,
        reason: String,
    },
    SessionClosed {
        session_id: SessionId,
        status: SessionStatus,
    },
    UnknownSignature,
    UnknownSubject,
}

enum StepProgress {
    Done,
    Waiting,
}

/// Owns the step graph and session lifecycle
pub struct WorkflowOrchestrator {
    store: Arc<SessionStore>,
    collaborators: Collaborators,
    notifier: Notifier,
    settings: WorkflowSettings,
}

impl WorkflowOrchestrator {
    pub fn new(store: Arc<SessionStore>, collaborators: Collaborators, settings: WorkflowSettings) -> Self {
        let notifier = collaborators.notifier();
        Self {
            store,
            collaborators,
            notifier,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Instantiate the eight steps and advance as far as possible
    pub async fn create_session(
        &self,
        trigger: TriggerEvent,
        identifiers: Option<SubjectIdentifiers>,
    ) -> Result<WorkflowSession, OrchestratorError> {
        validate_trigger(&trigger)?;

        let now = Utc::now();
        let required_training = ContractorRole::parse(&trigger.role)
            .and_then(|role| self.collaborators.permissions.required_training(role).ok())
            .unwrap_or_default();

        let session = WorkflowSession {
            id: generate_session_id(now),
            trigger,
            identifiers,
            status: SessionStatus::Active,
            steps: standard_steps(),
            signature_requests: Vec::new(),
            system_access: SystemAccessGrant::default(),
            training: TrainingRequirementSet::new(required_training),
            notifications: Vec::new(),
            created_at: now,
            last_activity: now,
            completed_at: None,
            cancellation: None,
        };

        let handle = self.store.insert(session).await?;
        let mut session = handle.lock().await;
        let span = create_workflow_span("create_session", &session.id, Some(session.subject_id()));

        info!(
            session.id = %session.id,
            subject.id = session.subject_id(),
            role = %session.trigger.role,
            "Onboarding session created"
        );

        let outcome = self.drive(&mut session).instrument(span).await;
        debug!(session.id = %session.id, outcome = ?outcome, "Initial advance finished");
        Ok(session.clone())
    }

    /// Caller-driven advance, used for retries after a backoff
    pub async fn advance(&self, session_id: &SessionId) -> Result<AdvanceOutcome, OrchestratorError> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;
        let span = create_workflow_span("advance", session_id, Some(session.subject_id()));
        Ok(self.drive(&mut session).instrument(span).await)
    }

    pub async fn apply_signature_callback(&self, webhook: SignatureWebhook) -> CallbackOutcome {
        let signature_id = webhook.signature_request_id.clone();
        let Some(handle) = self.store.find_by_signature(&signature_id).await else {
            warn!(signature.id = %signature_id, "Signature callback for unknown request dropped");
            return CallbackOutcome::UnknownSignature;
        };

        let mut session = handle.lock().await;
        let session_id = session.id.clone();
        if session.is_terminal() {
            info!(
                session.id = %session_id,
                signature.id = %signature_id,
                status = %session.status,
                "Late signature callback ignored for closed session"
            );
            return CallbackOutcome::SessionClosed {
                session_id,
                status: session.status,
            };
        }

        let now = Utc::now();
        let Some(request) = session.signature_mut(&signature_id) else {
            warn!(signature.id = %signature_id, "Signature index points at a session without the request");
            return CallbackOutcome::UnknownSignature;
        };

        if request.document_type != webhook.document_type || request.subject_id != webhook.subject_id {
            warn!(
                signature.id = %signature_id,
                expected.document = %request.document_type,
                received.document = %webhook.document_type,
                "Signature callback does not match the issued request"
            );
            return CallbackOutcome::Ignored {
                session_id,
                reason: "callback does not match the issued request".to_string(),
            };
        }

        let previous = request.status;
        let effect = signatures::apply_outcome(request, webhook.outcome, webhook.signed_artifact, now);
        match effect {
            CallbackEffect::Duplicate => {
                debug!(signature.id = %signature_id, "Duplicate signature callback");
                CallbackOutcome::Duplicate { session_id }
            }
            CallbackEffect::Ignored => CallbackOutcome::Ignored {
                session_id,
                reason: format!("signature already resolved as {previous:?}"),
            },
            CallbackEffect::Contradiction => {
                let document_type = request.document_type;
                request.status = webhook.outcome.status();
                session.touch(now);
                let progress = self
                    .fail_contradicted_signature(&mut session, document_type, webhook.outcome)
                    .await;
                CallbackOutcome::Applied { session_id, progress }
            }
            CallbackEffect::Updated => {
                info!(
                    session.id = %session_id,
                    signature.id = %signature_id,
                    outcome = ?webhook.outcome,
                    "Signature callback applied"
                );
                session.touch(now);
                let span = create_workflow_span("signature_callback", &session_id, Some(&webhook.subject_id));
                let progress = self.drive(&mut session).instrument(span).await;
                CallbackOutcome::Applied { session_id, progress }
            }
        }
    }

    pub async fn apply_training_completion(&self, subject_id: &str, module_id: &str) -> CallbackOutcome {
        let Some(handle) = self.store.find_latest_by_subject(subject_id).await else {
            warn!(subject.id = subject_id, module = module_id, "Training completion for unknown subject dropped");
            return CallbackOutcome::UnknownSubject;
        };

        let mut session = handle.lock().await;
        let session_id = session.id.clone();
        if session.is_terminal() {
            info!(
                session.id = %session_id,
                module = module_id,
                status = %session.status,
                "Late training completion ignored for closed session"
            );
            return CallbackOutcome::SessionClosed {
                session_id,
                status: session.status,
            };
        }

        match session.training.complete(module_id) {
            TrainingUpdate::AlreadyCompleted => CallbackOutcome::Duplicate { session_id },
            TrainingUpdate::NotAssigned => {
                warn!(session.id = %session_id, module = module_id, "Completion for a module that is not in progress");
                CallbackOutcome::Ignored {
                    session_id,
                    reason: format!("module {module_id} is not assigned"),
                }
            }
            TrainingUpdate::Recorded => {
                let now = Utc::now();
                session.touch(now);
                info!(
                    session.id = %session_id,
                    module = module_id,
                    remaining = ?session.training.remaining(),
                    "Training module completed"
                );

                if !session.training.all_completed {
                    return CallbackOutcome::Applied {
                        session_id,
                        progress: AdvanceOutcome::Blocked {
                            step: StepKind::AccessPending,
                        },
                    };
                }

                let gate_ready = session
                    .step(StepKind::AccessPending)
                    .map(|gate| session.dependencies_met(gate))
                    .unwrap_or(false);
                if gate_ready {
                    if let Some(gate) = session.step_mut(StepKind::AccessPending) {
                        gate.status = StepStatus::Completed;
                        gate.started_at.get_or_insert(now);
                        gate.completed_at = Some(now);
                    }
                    info!(session.id = %session_id, "Training gate opened");
                }

                let span = create_workflow_span("training_completion", &session_id, Some(subject_id));
                let progress = self.drive(&mut session).instrument(span).await;
                CallbackOutcome::Applied { session_id, progress }
            }
        }
    }

    /// Administrative cancellation; terminal
    pub async fn cancel_session(
        &self,
        session_id: &SessionId,
        actor: &str,
        reason: &str,
    ) -> Result<WorkflowSession, OrchestratorError> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;
        if session.is_terminal() {
            return Err(OrchestratorError::TerminalSession {
                session_id: session_id.clone(),
                status: session.status,
            });
        }

        let now = Utc::now();
        session.status = SessionStatus::Cancelled;
        session.cancellation = Some(Cancellation {
            cancelled_by: actor.to_string(),
            reason: reason.to_string(),
            cancelled_at: now,
        });
        for request in session.signature_requests.iter_mut() {
            if !request.status.is_resolved() {
                request.status = SignatureStatus::Cancelled;
            }
        }
        session.touch(now);

        warn!(session.id = %session_id, actor = actor, reason = reason, "Onboarding session cancelled");

        self.notify_subject(&mut session, "Your contractor onboarding has been cancelled. Please contact your administrator with any questions.".to_string())
            .await;
        let message = format!(
            "Contractor onboarding {} for {} cancelled by {}: {}",
            session_id,
            session.trigger.subject.full_name(),
            actor,
            reason
        );
        self.notify_admins(&mut session, message).await;

        let subject_id = session.subject_id().to_string();
        self.store.release_subject(&subject_id, session_id).await;
        Ok(session.clone())
    }

    /// Expire every open signature request past its deadline and advance the affected sessions
    pub async fn expire_overdue_signatures(&self, now: DateTime<Utc>) -> Vec<SignatureId> {
        let mut expired = Vec::new();
        for handle in self.store.handles().await {
            let mut session = handle.lock().await;
            if session.is_terminal() {
                continue;
            }

            let mut session_expired = Vec::new();
            for request in session.signature_requests.iter_mut() {
                if signatures::is_overdue(request, now) {
                    request.status = SignatureStatus::Expired;
                    session_expired.push(request.id.clone());
                }
            }
            if session_expired.is_empty() {
                continue;
            }

            warn!(
                session.id = %session.id,
                signatures = ?session_expired,
                "Signature requests expired"
            );
            session.touch(now);
            self.drive(&mut session).await;
            expired.extend(session_expired);
        }
        expired
    }

    /// Send due reminders for unsigned documents; returns the number sent
    pub async fn send_signature_reminders(&self, now: DateTime<Utc>) -> usize {
        let mut sent = 0;
        for handle in self.store.handles().await {
            let mut session = handle.lock().await;
            if session.is_terminal() {
                continue;
            }

            let mut messages = Vec::new();
            for request in session.signature_requests.iter_mut() {
                if signatures::reminder_due(request, &self.settings.signatures, now) {
                    request.reminders_sent += 1;
                    request.last_reminder_at = Some(now);
                    messages.push(format!(
                        "Reminder: please sign your {} before {}: {}",
                        request.document_type,
                        request.expires_at.format("%Y-%m-%d"),
                        request.signature_url
                    ));
                }
            }

            for message in messages {
                self.notify_subject(&mut session, message).await;
                sent += 1;
            }
        }
        if sent > 0 {
            info!(reminders = sent, "Signature reminders sent");
        }
        sent
    }

    pub async fn session(&self, session_id: &SessionId) -> Option<WorkflowSession> {
        match self.store.get(session_id).await {
            Some(handle) => Some(handle.lock().await.clone()),
            None => None,
        }
    }

    pub async fn active_session_for(&self, subject_id: &str) -> Option<WorkflowSession> {
        match self.store.find_active_by_subject(subject_id).await {
            Some(handle) => Some(handle.lock().await.clone()),
            None => None,
        }
    }

    pub async fn session_by_signature(&self, signature_id: &SignatureId) -> Option<WorkflowSession> {
        match self.store.find_by_signature(signature_id).await {
            Some(handle) => Some(handle.lock().await.clone()),
            None => None,
        }
    }

    pub async fn sessions(&self) -> Vec<WorkflowSession> {
        self.store.sessions().await
    }

    async fn handle(&self, session_id: &SessionId) -> Result<SessionHandle, OrchestratorError> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| OrchestratorError::SessionNotFound(session_id.clone()))
    }

    /// Run steps in order until the session completes, blocks, schedules a retry or fails.
    /// The caller holds the session lock.
    async fn drive(&self, session: &mut WorkflowSession) -> AdvanceOutcome {
        loop {
            match session.status {
                SessionStatus::Active => {}
                SessionStatus::Completed => return AdvanceOutcome::Completed,
                SessionStatus::Cancelled => return AdvanceOutcome::Cancelled,
                SessionStatus::Failed => return failed_outcome(session),
            }

            let Some(index) = session.steps.iter().position(|s| !s.status.is_done()) else {
                self.complete_session(session).await;
                return AdvanceOutcome::Completed;
            };
            let kind = session.steps[index].id;

            if !session.dependencies_met(&session.steps[index]) {
                debug!(session.id = %session.id, step.id = %kind, "Dependencies not met");
                return AdvanceOutcome::Blocked { step: kind };
            }

            let now = Utc::now();
            let step = &mut session.steps[index];
            if step.status == StepStatus::Pending {
                step.status = StepStatus::InProgress;
                step.started_at = Some(now);
                debug!(step.id = %kind, attempt = step.retry_count + 1, "Step started");
            }
            let automated = step.automated;
            session.touch(now);

            if !automated {
                debug!(session.id = %session.id, step.id = %kind, "Waiting for external signal");
                return AdvanceOutcome::Blocked { step: kind };
            }

            match self.execute_step(session, kind).await {
                Ok(StepProgress::Done) => {
                    let step = &mut session.steps[index];
                    step.status = StepStatus::Completed;
                    step.completed_at = Some(Utc::now());
                    step.failure_reason = None;
                    info!(session.id = %session.id, step.id = %kind, "Step completed");
                }
                Ok(StepProgress::Waiting) => {
                    debug!(session.id = %session.id, step.id = %kind, "Step waiting on external events");
                    return AdvanceOutcome::Blocked { step: kind };
                }
                Err(e) => return self.record_step_failure(session, index, e).await,
            }
        }
    }

    async fn execute_step(&self, session: &mut WorkflowSession, kind: StepKind) -> Result<StepProgress, StepError> {
        match kind {
            StepKind::UserVerification => self.verify_user(session),
            StepKind::DocumentGeneration => self.generate_documents(session).await,
            StepKind::SignatureRequest => self.request_signatures(session).await,
            StepKind::SignatureValidation => validate_signatures(session),
            StepKind::SectionAccessCreation => self.create_section_access(session).await,
            StepKind::TrainingAssignment => self.assign_training(session).await,
            StepKind::AccessPending => Ok(StepProgress::Waiting),
            StepKind::FullAccessGrant => self.grant_full_access(session).await,
        }
    }

    fn verify_user(&self, session: &mut WorkflowSession) -> Result<StepProgress, StepError> {
        let role = session_role(session)?;

        let identifiers = match &session.identifiers {
            Some(identifiers) => identifiers.clone(),
            None => {
                let request = IdentityRequest::for_subject(&session.trigger.subject, role.as_str());
                self.collaborators.identity.resolve(&request)?
            }
        };

        info!(
            session.id = %session.id,
            registry.user_id = %identifiers.user_id,
            "User verified"
        );
        if let Some(step) = session.step_mut(StepKind::UserVerification) {
            step.data.insert("user_id".to_string(), json!(identifiers.user_id));
            step.data.insert("system_id".to_string(), json!(identifiers.system_id));
        }
        session.identifiers = Some(identifiers);
        Ok(StepProgress::Done)
    }

    async fn generate_documents(&self, session: &mut WorkflowSession) -> Result<StepProgress, StepError> {
        let role = session_role(session)?;
        let identifiers = session
            .identifiers
            .clone()
            .ok_or_else(|| StepError::Terminal("subject identifiers were not resolved".to_string()))?;

        let documents = self
            .collaborators
            .documents
            .render(role, &session.trigger.subject, &identifiers)
            .await?;

        if let Some(step) = session.step_mut(StepKind::DocumentGeneration) {
            step.data.insert(
                DocumentType::ContractorAgreement.as_str().to_string(),
                json!(documents.contractor_agreement),
            );
            step.data.insert(DocumentType::Nda.as_str().to_string(), json!(documents.nda));
            step.data.insert("generated_at".to_string(), json!(Utc::now()));
        }
        info!(session.id = %session.id, "Onboarding documents generated");
        Ok(StepProgress::Done)
    }

    async fn request_signatures(&self, session: &mut WorkflowSession) -> Result<StepProgress, StepError> {
        let generated = session
            .step(StepKind::DocumentGeneration)
            .map(|step| step.data.clone())
            .unwrap_or_default();

        let now = Utc::now();
        let subject_id = session.subject_id().to_string();
        let mut issued = Vec::new();
        for document_type in DocumentType::REQUIRED {
            let already_open = session
                .signature_requests
                .iter()
                .any(|r| r.document_type == document_type && !r.status.is_resolved());
            if already_open {
                continue;
            }

            let content = generated
                .get(document_type.as_str())
                .and_then(|value| value.as_str())
                .ok_or_else(|| {
                    StepError::Terminal(format!("{document_type} content not found for signature request"))
                })?;
            issued.push(signatures::issue_request(
                &session.id,
                &subject_id,
                document_type,
                content.to_string(),
                &self.settings.signatures,
                now,
            ));
        }

        if issued.is_empty() {
            return Ok(StepProgress::Done);
        }

        let ids: Vec<SignatureId> = issued.iter().map(|r| r.id.clone()).collect();
        self.store.register_signatures(&session.id, &ids).await;

        let links = issued
            .iter()
            .map(|r| format!("{}: {}", r.document_type, r.signature_url))
            .collect::<Vec<_>>()
            .join(", ");
        session.signature_requests.extend(issued);

        info!(session.id = %session.id, signatures = ?ids, "Signature requests sent");
        self.notify_subject(session, format!("Please sign your contractor documents. {links}"))
            .await;
        Ok(StepProgress::Done)
    }

    async fn create_section_access(&self, session: &mut WorkflowSession) -> Result<StepProgress, StepError> {
        let role = session_role(session)?;
        let permissions = self.collaborators.permissions.sections_for(role)?;

        session.system_access.grant_initial(permissions.initial, Utc::now());
        info!(
            session.id = %session.id,
            sections = ?session.system_access.sections,
            "Initial section access created"
        );
        self.notify_subject(
            session,
            "Your initial system access has been granted. Complete your training to unlock full access.".to_string(),
        )
        .await;
        Ok(StepProgress::Done)
    }

    async fn assign_training(&self, session: &mut WorkflowSession) -> Result<StepProgress, StepError> {
        let role = session_role(session)?;
        let modules = self.collaborators.permissions.required_training(role)?;
        if modules.is_empty() {
            return Err(StepError::Terminal(format!("no training modules configured for {role}")));
        }

        let list = modules.join(", ");
        session.training.assign(modules);
        info!(session.id = %session.id, modules = %list, "Training assigned");
        self.notify_subject(
            session,
            format!("Your training modules have been assigned: {list}. Please complete them to gain full system access."),
        )
        .await;
        Ok(StepProgress::Done)
    }

    async fn grant_full_access(&self, session: &mut WorkflowSession) -> Result<StepProgress, StepError> {
        let role = session_role(session)?;
        let permissions = self.collaborators.permissions.sections_for(role)?;

        session.system_access.grant_full(permissions.full, Utc::now());
        info!(
            session.id = %session.id,
            sections = ?session.system_access.sections,
            "Full access granted"
        );
        self.notify_subject(
            session,
            "Congratulations! You have completed all requirements and now have full system access.".to_string(),
        )
        .await;
        Ok(StepProgress::Done)
    }

    async fn record_step_failure(&self, session: &mut WorkflowSession, index: usize, e: StepError) -> AdvanceOutcome {
        let backoff = self.settings.retry_backoff;
        let step = &mut session.steps[index];
        let kind = step.id;
        step.retry_count += 1;
        step.failure_reason = Some(e.to_string());

        if e.is_retryable() && step.retry_count < step.max_retries {
            step.status = StepStatus::Pending;
            warn!(
                session.id = %session.id,
                step.id = %kind,
                attempt = step.retry_count,
                max_retries = step.max_retries,
                error = %e,
                "Step failed, retry scheduled"
            );
            return AdvanceOutcome::RetryScheduled {
                step: kind,
                attempt: step.retry_count,
                backoff,
            };
        }

        step.status = StepStatus::Failed;
        let step_name = step.name.clone();
        error!(
            session.id = %session.id,
            step.id = %kind,
            attempts = step.retry_count,
            error = %e,
            "Step failed permanently"
        );
        self.fail_session(session, &step_name, &e.to_string()).await;
        AdvanceOutcome::Failed {
            step: kind,
            reason: e.to_string(),
        }
    }

    /// A rejection for an already signed document invalidates the signed set
    async fn fail_contradicted_signature(
        &self,
        session: &mut WorkflowSession,
        document_type: DocumentType,
        outcome: SignatureOutcome,
    ) -> AdvanceOutcome {
        warn!(
            session.id = %session.id,
            document = %document_type,
            outcome = ?outcome,
            "Rejection received for a signed document"
        );

        let validated = session.step_status(StepKind::SignatureValidation) == Some(StepStatus::Completed);
        if !validated {
            return self.drive(session).await;
        }

        let Some(index) = session.steps.iter().position(|s| !s.status.is_done()) else {
            return AdvanceOutcome::Completed;
        };
        let reason = format!("signed {document_type} was later reported {outcome:?}");
        self.record_step_failure(session, index, StepError::Terminal(reason)).await
    }

    async fn fail_session(&self, session: &mut WorkflowSession, step_name: &str, reason: &str) {
        session.status = SessionStatus::Failed;
        session.touch(Utc::now());

        let message = format!(
            "Contractor onboarding failed at step: {} for {} ({}). Manual intervention required. Reason: {}",
            step_name,
            session.trigger.subject.full_name(),
            session.id,
            reason
        );
        self.notify_admins(session, message).await;
        self.notify_subject(
            session,
            "We could not complete your contractor onboarding. An administrator has been notified and will contact you.".to_string(),
        )
        .await;

        let subject_id = session.subject_id().to_string();
        let session_id = session.id.clone();
        self.store.release_subject(&subject_id, &session_id).await;
    }

    async fn complete_session(&self, session: &mut WorkflowSession) {
        let now = Utc::now();
        session.status = SessionStatus::Completed;
        session.completed_at = Some(now);
        session.touch(now);

        info!(session.id = %session.id, subject.id = session.subject_id(), "Contractor onboarding completed");
        let message = format!(
            "Contractor onboarding completed successfully for {}",
            session.trigger.subject.full_name()
        );
        self.notify_admins(session, message).await;

        let subject_id = session.subject_id().to_string();
        let session_id = session.id.clone();
        self.store.release_subject(&subject_id, &session_id).await;
    }

    async fn notify_subject(&self, session: &mut WorkflowSession, message: String) {
        let email = session.trigger.subject.email.clone();
        let record = self.notifier.send(NotificationChannel::Email, &email, message).await;
        session.notifications.push(record);
    }

    async fn notify_admins(&self, session: &mut WorkflowSession, message: String) {
        let records = self
            .notifier
            .broadcast(NotificationChannel::System, &self.settings.admin_recipients, &message)
            .await;
        session.notifications.extend(records);
    }
}

impl std::fmt::Debug for WorkflowOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowOrchestrator")
            .field("store", &self.store)
            .field("collaborators", &self.collaborators)
            .field("settings", &self.settings)
            .finish()
    }
}

fn validate_trigger(trigger: &TriggerEvent) -> Result<(), OrchestratorError> {
    let subject = &trigger.subject;
    let missing = if subject.user_id.trim().is_empty() {
        Some("subject user id")
    } else if subject.email.trim().is_empty() {
        Some("subject email")
    } else if trigger.role.trim().is_empty() {
        Some("role")
    } else {
        None
    };

    match missing {
        Some(field) => Err(OrchestratorError::InvalidRequest {
            reason: format!("{field} is required"),
        }),
        None => Ok(()),
    }
}

fn generate_session_id(now: DateTime<Utc>) -> SessionId {
    SessionId(format!("CWS-{}-{}", now.timestamp_millis(), signatures::random_suffix(9)))
}

fn session_role(session: &WorkflowSession) -> Result<ContractorRole, StepError> {
    ContractorRole::parse(&session.trigger.role).ok_or_else(|| {
        StepError::Terminal(format!(
            "Invalid role for contractor onboarding: {}",
            session.trigger.role
        ))
    })
}

fn validate_signatures(session: &WorkflowSession) -> Result<StepProgress, StepError> {
    match signatures::check_required(&session.required_signatures()) {
        SignatureCheck::AllSigned => {
            info!(session.id = %session.id, "All signatures validated");
            Ok(StepProgress::Done)
        }
        SignatureCheck::Outstanding(documents) => {
            debug!(session.id = %session.id, outstanding = ?documents, "Signatures outstanding");
            Ok(StepProgress::Waiting)
        }
        SignatureCheck::Rejected { document_type, status } => Err(StepError::Terminal(format!(
            "signature for {document_type} was {status:?}"
        ))),
        SignatureCheck::MissingArtifact(document_type) => Err(StepError::Terminal(format!(
            "invalid signature data for {document_type}"
        ))),
    }
}

fn failed_outcome(session: &WorkflowSession) -> AdvanceOutcome {
    match session.steps.iter().find(|s| s.status == StepStatus::Failed) {
        Some(step) => AdvanceOutcome::Failed {
            step: step.id,
            reason: step.failure_reason.clone().unwrap_or_default(),
        },
        None => AdvanceOutcome::Failed {
            step: StepKind::UserVerification,
            reason: "session failed".to_string(),
        },
    }
}
