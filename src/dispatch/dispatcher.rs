use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn, Instrument};

use super::policy::{DispatchPolicy, PolicyDecision};
use super::statistics::summarize;
use super::types::{DispatchStatistics, StatisticsWindow, TriggerLog, TriggerOutcome};
use crate::collaborators::{
    CollaboratorError, Collaborators, IdentityRegistry, IdentityRequest, Notifier,
};
use crate::store::TriggerLogStore;
use crate::telemetry::{create_dispatch_span, generate_correlation_id};
use crate::types::{
    ContractorRole, Notification, NotificationChannel, SessionId, SubjectProfile, TriggerEvent,
    TriggerSource,
};
use crate::workflow::{OrchestratorError, WorkflowOrchestrator};

#[derive(Debug, Error)]
enum DispatchError {
    #[error("Role {0} is not eligible for contractor onboarding")]
    IneligibleRole(String),

    #[error("Identity resolution failed: {0}")]
    Identity(#[from] CollaboratorError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Intermediate result before timing and log assembly
struct Attempt {
    outcome: TriggerOutcome,
    session_id: Option<SessionId>,
    error: Option<String>,
    skip_reason: Option<String>,
}

impl Attempt {
    fn skipped(reason: String) -> Self {
        Self {
            outcome: TriggerOutcome::Skipped,
            session_id: None,
            error: None,
            skip_reason: Some(reason),
        }
    }
}

/// Turns trigger events into onboarding sessions and keeps the audit trail
pub struct TriggerDispatcher {
    policy: DispatchPolicy,
    orchestrator: Arc<WorkflowOrchestrator>,
    log: Arc<TriggerLogStore>,
    identity: Arc<dyn IdentityRegistry>,
    notifier: Notifier,
}

impl TriggerDispatcher {
    pub fn new(
        policy: DispatchPolicy,
        orchestrator: Arc<WorkflowOrchestrator>,
        log: Arc<TriggerLogStore>,
        collaborators: &Collaborators,
    ) -> Self {
        Self {
            policy,
            orchestrator,
            log,
            identity: collaborators.identity.clone(),
            notifier: collaborators.notifier(),
        }
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Process a user-creation or role-change event. Always yields a log entry.
    pub async fn dispatch(&self, event: TriggerEvent) -> TriggerLog {
        self.process(event).await
    }

    /// Administrator-initiated start for one subject
    pub async fn manual_dispatch(&self, subject: SubjectProfile, role: &str, actor: &str) -> TriggerLog {
        let event = TriggerEvent::new(subject, role.trim(), TriggerSource::Manual, actor);
        self.process(event).await
    }

    pub async fn statistics(&self, window: Option<StatisticsWindow>) -> DispatchStatistics {
        summarize(&self.log.entries().await, window)
    }

    async fn process(&self, event: TriggerEvent) -> TriggerLog {
        let started = Instant::now();
        let correlation_id = generate_correlation_id();
        let span = create_dispatch_span(
            &correlation_id,
            &event.subject.user_id,
            &event.role,
            event.source.is_manual(),
        );

        let mut notifications = Vec::new();
        let attempt = self
            .run(&event, &mut notifications)
            .instrument(span.clone())
            .await;

        let entry = TriggerLog {
            id: format!("LOG-{}", uuid::Uuid::new_v4().simple()),
            event,
            outcome: attempt.outcome,
            session_id: attempt.session_id,
            error: attempt.error,
            skip_reason: attempt.skip_reason,
            duration_ms: elapsed_millis(started.elapsed()),
            notifications,
            recorded_at: Utc::now(),
        };

        span.in_scope(|| {
            info!(
                log.id = %entry.id,
                outcome = %entry.outcome,
                session.id = entry.session_id.as_ref().map(|id| id.0.as_str()),
                duration_ms = entry.duration_ms,
                "Trigger dispatch recorded"
            );
        });
        self.log.append(entry.clone()).await;
        entry
    }

    async fn run(&self, event: &TriggerEvent, notifications: &mut Vec<Notification>) -> Attempt {
        match self.policy.evaluate(event) {
            PolicyDecision::Skip(reason) => {
                info!(reason = %reason, "Trigger skipped");
                return Attempt::skipped(reason);
            }
            PolicyDecision::RequireApproval => {
                let message = format!(
                    "Approval required: contractor onboarding for {} ({}) as {}",
                    event.subject.full_name(),
                    event.subject.email,
                    event.role
                );
                notifications.extend(self.notify_admins(&message).await);
                info!("Trigger paused for administrator approval");
                return Attempt {
                    outcome: TriggerOutcome::ApprovalRequested,
                    session_id: None,
                    error: None,
                    skip_reason: None,
                };
            }
            PolicyDecision::Proceed => {}
        }

        match self.start_session(event).await {
            Ok(session_id) => {
                notifications.extend(self.announce_start(event, &session_id).await);
                Attempt {
                    outcome: TriggerOutcome::Success,
                    session_id: Some(session_id),
                    error: None,
                    skip_reason: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Onboarding automation failed");
                let message = format!(
                    "Contractor onboarding automation failed for {} ({}): {}. Manual intervention required.",
                    event.subject.full_name(),
                    event.subject.user_id,
                    e
                );
                notifications.extend(self.notify_admins(&message).await);
                Attempt {
                    outcome: TriggerOutcome::Failure,
                    session_id: None,
                    error: Some(e.to_string()),
                    skip_reason: None,
                }
            }
        }
    }

    async fn start_session(&self, event: &TriggerEvent) -> Result<SessionId, DispatchError> {
        if event.source.is_manual() && ContractorRole::parse(&event.role).is_none() {
            return Err(DispatchError::IneligibleRole(event.role.clone()));
        }

        let identifiers = self
            .identity
            .resolve(&IdentityRequest::for_subject(&event.subject, &event.role))?;
        let session = self
            .orchestrator
            .create_session(event.clone(), Some(identifiers))
            .await?;

        if session.is_terminal() {
            warn!(
                session.id = %session.id,
                status = %session.status,
                "Session reached a terminal state during its first advance"
            );
        }
        Ok(session.id)
    }

    async fn announce_start(&self, event: &TriggerEvent, session_id: &SessionId) -> Vec<Notification> {
        let subject = &event.subject;
        let mut sent = Vec::new();

        sent.push(
            self.notifier
                .send(
                    NotificationChannel::Email,
                    &subject.email,
                    format!(
                        "Welcome aboard, {}! Your contractor onboarding as {} has started. Watch for your documents to sign.",
                        subject.first_name, event.role
                    ),
                )
                .await,
        );

        let admin_message = format!(
            "New contractor onboarding initiated for {} ({}), session {}",
            subject.full_name(),
            subject.email,
            session_id
        );
        sent.extend(self.notify_admins(&admin_message).await);

        if let Some(recipient) = self.policy.compliance_target() {
            sent.push(
                self.notifier
                    .send(
                        NotificationChannel::Email,
                        recipient,
                        format!(
                            "Compliance notice: contractor onboarding started for {} as {} (hire date {}), session {}",
                            subject.full_name(),
                            event.role,
                            subject.hire_date,
                            session_id
                        ),
                    )
                    .await,
            );
        }
        sent
    }

    async fn notify_admins(&self, message: &str) -> Vec<Notification> {
        self.notifier
            .broadcast(NotificationChannel::System, &self.policy.admin_recipients, message)
            .await
    }
}

/// Saturates instead of wrapping on absurd durations
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for TriggerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerDispatcher")
            .field("policy", &self.policy)
            .field("orchestrator", &self.orchestrator)
            .field("log", &self.log)
            .finish()
    }
}
