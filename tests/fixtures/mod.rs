//! Shared fixtures for onboarding integration tests
//!
//! Hand-written fakes for the collaborator seams plus an engine builder that
//! wires the dispatcher and orchestrator over fresh in-memory stores.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use contractor_onboarding::collaborators::{
    CollaboratorError, Collaborators, DocumentRenderer, NotificationTransport, RenderedDocuments,
    SubjectIdentifiers, TemplateDocumentRenderer,
};
use contractor_onboarding::dispatch::{DispatchPolicy, TriggerDispatcher};
use contractor_onboarding::store::{SessionStore, TriggerLogStore};
use contractor_onboarding::types::{
    ContractorRole, NotificationChannel, SubjectProfile, TriggerEvent, TriggerSource,
};
use contractor_onboarding::workflow::{
    SignatureOutcome, SignatureRequest, SignatureWebhook, SignedArtifact, WorkflowOrchestrator,
    WorkflowSettings,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub channel: NotificationChannel,
    pub recipient: String,
    pub message: String,
}

/// Records every message; can be switched to report non-delivery
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    undeliverable: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undeliverable() -> Self {
        Self {
            undeliverable: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages_to(&self, recipient: &str) -> Vec<SentMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.recipient == recipient)
            .collect()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn send(
        &self,
        channel: NotificationChannel,
        recipient: &str,
        message: &str,
    ) -> Result<bool, CollaboratorError> {
        self.sent.lock().unwrap().push(SentMessage {
            channel,
            recipient: recipient.to_string(),
            message: message.to_string(),
        });
        if self.undeliverable {
            return Err(CollaboratorError::Unavailable("smtp relay down".to_string()));
        }
        Ok(true)
    }
}

/// Fails the first `failures` renders with a transient error, then renders normally
#[derive(Debug)]
pub struct FlakyRenderer {
    failures: u32,
    calls: AtomicU32,
    inner: TemplateDocumentRenderer,
}

impl FlakyRenderer {
    pub fn new(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            inner: TemplateDocumentRenderer::new(),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentRenderer for FlakyRenderer {
    async fn render(
        &self,
        role: ContractorRole,
        subject: &SubjectProfile,
        identifiers: &SubjectIdentifiers,
    ) -> Result<RenderedDocuments, CollaboratorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(CollaboratorError::Unavailable(format!("template store timeout #{call}")));
        }
        self.inner.render(role, subject, identifiers).await
    }
}

pub const ADMIN: &str = "onboarding-admins";

pub fn subject(user_id: &str) -> SubjectProfile {
    SubjectProfile {
        user_id: user_id.to_string(),
        first_name: "Sarah".to_string(),
        last_name: "Johnson".to_string(),
        email: format!("{user_id}@contractors.example.com"),
        phone: "555-0123".to_string(),
        department: "Dispatch".to_string(),
        hire_date: NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
    }
}

pub fn user_created(user_id: &str, role: &str) -> TriggerEvent {
    TriggerEvent::new(subject(user_id), role, TriggerSource::UserCreation, "user-management")
}

pub fn artifact() -> SignedArtifact {
    SignedArtifact {
        signature_blob: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        timestamp: Utc::now(),
        device_info: "Mozilla/5.0".to_string(),
        ip_address: "203.0.113.7".to_string(),
        location: Some("Denver, CO".to_string()),
    }
}

pub fn webhook(request: &SignatureRequest, outcome: SignatureOutcome) -> SignatureWebhook {
    SignatureWebhook {
        signature_request_id: request.id.clone(),
        subject_id: request.subject_id.clone(),
        document_type: request.document_type,
        outcome,
        signed_artifact: match outcome {
            SignatureOutcome::Signed => Some(artifact()),
            _ => None,
        },
    }
}

/// Dispatcher and orchestrator over fresh stores with a recording transport
pub struct TestEngine {
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub dispatcher: TriggerDispatcher,
    pub sessions: Arc<SessionStore>,
    pub log: Arc<TriggerLogStore>,
    pub transport: Arc<RecordingTransport>,
}

pub struct TestEngineBuilder {
    policy: DispatchPolicy,
    settings: WorkflowSettings,
    collaborators: Collaborators,
    transport: Arc<RecordingTransport>,
}

impl TestEngineBuilder {
    pub fn policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn documents(mut self, documents: Arc<dyn DocumentRenderer>) -> Self {
        self.collaborators = self.collaborators.with_documents(documents);
        self
    }

    pub fn transport(mut self, transport: RecordingTransport) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn build(self) -> TestEngine {
        let collaborators = self.collaborators.with_transport(self.transport.clone());
        let sessions = Arc::new(SessionStore::new());
        let log = Arc::new(TriggerLogStore::new());
        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            sessions.clone(),
            collaborators.clone(),
            self.settings,
        ));
        let dispatcher = TriggerDispatcher::new(self.policy, orchestrator.clone(), log.clone(), &collaborators);

        TestEngine {
            orchestrator,
            dispatcher,
            sessions,
            log,
            transport: self.transport,
        }
    }
}

impl TestEngine {
    pub fn builder() -> TestEngineBuilder {
        TestEngineBuilder {
            policy: DispatchPolicy::default(),
            settings: WorkflowSettings::default(),
            collaborators: Collaborators::standard(),
            transport: Arc::new(RecordingTransport::new()),
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }
}
