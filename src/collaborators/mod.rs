/// External collaborator seams for the onboarding engine
///
/// The orchestrator and dispatcher never talk to the identity registry, the
/// permission tables, the document templates or the notification transport
/// directly. Each is a trait here so tests can swap in mocks (`mockall`) or
/// hand-written fakes.
pub mod documents;
pub mod identity;
pub mod notifications;
pub mod permissions;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::types::{ContractorRole, NotificationChannel, SubjectProfile};

pub use documents::TemplateDocumentRenderer;
pub use identity::RegistryIdentityService;
pub use notifications::{Notifier, TracingTransport};
pub use permissions::StaticPermissionCatalog;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The input can never succeed, retrying is pointless
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Input to the identity registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub hire_date: NaiveDate,
}

impl IdentityRequest {
    pub fn for_subject(subject: &SubjectProfile, role: &str) -> Self {
        Self {
            first_name: subject.first_name.clone(),
            last_name: subject.last_name.clone(),
            email: subject.email.clone(),
            role: role.to_string(),
            department: subject.department.clone(),
            hire_date: subject.hire_date,
        }
    }
}

/// Human-readable registry codes minted for a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectIdentifiers {
    pub user_id: String,
    pub initials: String,
    pub department_code: String,
    pub hire_date_code: String,
    pub system_id: String,
    pub employee_code: String,
    pub access_code: String,
    pub email_prefix: String,
    pub security_level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    pub initial: Vec<String>,
    pub full: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocuments {
    pub contractor_agreement: String,
    pub nda: String,
}

/// Mints deterministic identifiers; a pure function from the engine's point of view
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait IdentityRegistry: Send + Sync {
    fn resolve(&self, request: &IdentityRequest) -> Result<SubjectIdentifiers, CollaboratorError>;
}

/// Role to section/training tables
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait PermissionCatalog: Send + Sync {
    fn sections_for(&self, role: ContractorRole) -> Result<RolePermissions, CollaboratorError>;

    fn required_training(&self, role: ContractorRole) -> Result<Vec<String>, CollaboratorError>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(
        &self,
        role: ContractorRole,
        subject: &SubjectProfile,
        identifiers: &SubjectIdentifiers,
    ) -> Result<RenderedDocuments, CollaboratorError>;
}

/// Delivery of email/sms/system messages. `Ok(false)` and `Err` both mean "not delivered".
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(
        &self,
        channel: NotificationChannel,
        recipient: &str,
        message: &str,
    ) -> Result<bool, CollaboratorError>;
}

/// The full set of collaborators handed to the engine
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityRegistry>,
    pub permissions: Arc<dyn PermissionCatalog>,
    pub documents: Arc<dyn DocumentRenderer>,
    pub transport: Arc<dyn NotificationTransport>,
}

impl Collaborators {
    /// Built-in implementations: deterministic registry, static role tables,
    /// HTML templates and a transport that only logs
    pub fn standard() -> Self {
        Self {
            identity: Arc::new(RegistryIdentityService::new()),
            permissions: Arc::new(StaticPermissionCatalog::new()),
            documents: Arc::new(TemplateDocumentRenderer::new()),
            transport: Arc::new(TracingTransport),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn NotificationTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentRenderer>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionCatalog>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityRegistry>) -> Self {
        self.identity = identity;
        self
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.transport.clone())
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("identity", &"Arc<dyn IdentityRegistry>")
            .field("permissions", &"Arc<dyn PermissionCatalog>")
            .field("documents", &"Arc<dyn DocumentRenderer>")
            .field("transport", &"Arc<dyn NotificationTransport>")
            .finish()
    }
}
