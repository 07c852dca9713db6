use async_trait::async_trait;

use super::{CollaboratorError, DocumentRenderer, RenderedDocuments, SubjectIdentifiers};
use crate::types::{ContractorRole, SubjectProfile};

/// Renders the contractor agreement and NDA from built-in HTML templates
#[derive(Debug, Default, Clone)]
pub struct TemplateDocumentRenderer;

impl TemplateDocumentRenderer {
    pub fn new() -> Self {
        Self
    }

    fn agreement(role: ContractorRole, subject: &SubjectProfile, ids: &SubjectIdentifiers) -> String {
        format!(
            "<html><h1>Independent Contractor Agreement</h1>\
             <p>Contractor: {name} ({user_id})</p>\
             <p>Role: {role}, Department: {department}</p>\
             <p>Effective date: {hire_date}</p></html>",
            name = subject.full_name(),
            user_id = ids.user_id,
            role = role,
            department = subject.department,
            hire_date = subject.hire_date,
        )
    }

    fn nda(subject: &SubjectProfile, ids: &SubjectIdentifiers) -> String {
        format!(
            "<html><h1>Non-Disclosure Agreement</h1>\
             <p>Recipient: {name} ({system_id})</p>\
             <p>Contact: {email}</p></html>",
            name = subject.full_name(),
            system_id = ids.system_id,
            email = subject.email,
        )
    }
}

#[async_trait]
impl DocumentRenderer for TemplateDocumentRenderer {
    async fn render(
        &self,
        role: ContractorRole,
        subject: &SubjectProfile,
        identifiers: &SubjectIdentifiers,
    ) -> Result<RenderedDocuments, CollaboratorError> {
        if subject.first_name.trim().is_empty() || subject.last_name.trim().is_empty() {
            return Err(CollaboratorError::InvalidInput(
                "subject name is required for document templates".to_string(),
            ));
        }

        Ok(RenderedDocuments {
            contractor_agreement: Self::agreement(role, subject, identifiers),
            nda: Self::nda(subject, identifiers),
        })
    }
}
