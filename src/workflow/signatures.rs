// Signature request lifecycle: issuing, webhook application, validation, expiry and reminders

use chrono::{DateTime, Duration, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

use super::types::{
    DocumentType, SignatureOutcome, SignatureRequest, SignatureStatus, SignedArtifact,
};
use crate::types::{SessionId, SignatureId};

static TOKEN_UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("static regex is valid"));

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureSettings {
    pub base_url: String,
    pub expiry: Duration,
    /// Days before expiry at which a reminder goes out
    pub reminder_days: Vec<i64>,
    pub max_reminders: u32,
}

impl Default for SignatureSettings {
    fn default() -> Self {
        Self {
            base_url: "https://signature.example.com".to_string(),
            expiry: Duration::days(7),
            reminder_days: vec![3, 1],
            max_reminders: 3,
        }
    }
}

pub(crate) fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}

pub fn generate_signature_id(now: DateTime<Utc>) -> SignatureId {
    SignatureId(format!("SIG-{}-{}", now.timestamp_millis(), random_suffix(9)))
}

fn signing_token(subject_id: &str, document_type: DocumentType, now: DateTime<Utc>) -> String {
    let raw = format!(
        "{subject_id}{}{}{}",
        document_type.as_str(),
        now.timestamp_millis(),
        random_suffix(6)
    );
    TOKEN_UNSAFE_CHARS.replace_all(&raw, "").into_owned()
}

/// Create a request for one document and mark it sent
pub fn issue_request(
    session_id: &SessionId,
    subject_id: &str,
    document_type: DocumentType,
    document_content: String,
    settings: &SignatureSettings,
    now: DateTime<Utc>,
) -> SignatureRequest {
    let token = signing_token(subject_id, document_type, now);
    SignatureRequest {
        id: generate_signature_id(now),
        session_id: session_id.clone(),
        subject_id: subject_id.to_string(),
        document_type,
        document_content,
        signature_url: format!("{}/sign/{}", settings.base_url.trim_end_matches('/'), token),
        token,
        status: SignatureStatus::Sent,
        created_at: now,
        sent_at: Some(now),
        signed_at: None,
        expires_at: now + settings.expiry,
        reminders_sent: 0,
        last_reminder_at: None,
        signed_artifact: None,
    }
}

/// Effect of applying a webhook outcome to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackEffect {
    /// Status changed
    Updated,
    /// Same outcome delivered again
    Duplicate,
    /// Request was already resolved differently and the new outcome is ignored
    Ignored,
    /// A rejection arrived for a document already signed
    Contradiction,
}

pub fn apply_outcome(
    request: &mut SignatureRequest,
    outcome: SignatureOutcome,
    artifact: Option<SignedArtifact>,
    now: DateTime<Utc>,
) -> CallbackEffect {
    let new_status = outcome.status();
    if request.status == new_status {
        return CallbackEffect::Duplicate;
    }
    if request.status == SignatureStatus::Signed && new_status.is_rejection() {
        return CallbackEffect::Contradiction;
    }
    if request.status.is_resolved() {
        return CallbackEffect::Ignored;
    }

    request.status = new_status;
    if outcome == SignatureOutcome::Signed {
        request.signed_at = Some(now);
        request.signed_artifact = artifact;
    }
    CallbackEffect::Updated
}

/// Result of checking the required document set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    AllSigned,
    Outstanding(Vec<DocumentType>),
    Rejected {
        document_type: DocumentType,
        status: SignatureStatus,
    },
    MissingArtifact(DocumentType),
}

/// `requests` holds the latest request per required document type
pub fn check_required(requests: &[&SignatureRequest]) -> SignatureCheck {
    if let Some(rejected) = requests.iter().find(|r| r.status.is_rejection() || r.status == SignatureStatus::Cancelled) {
        return SignatureCheck::Rejected {
            document_type: rejected.document_type,
            status: rejected.status,
        };
    }

    let mut outstanding: Vec<DocumentType> = DocumentType::REQUIRED
        .iter()
        .filter(|doc| !requests.iter().any(|r| r.document_type == **doc))
        .copied()
        .collect();
    outstanding.extend(
        requests
            .iter()
            .filter(|r| r.status != SignatureStatus::Signed)
            .map(|r| r.document_type),
    );
    if !outstanding.is_empty() {
        outstanding.sort();
        return SignatureCheck::Outstanding(outstanding);
    }

    if let Some(unsigned) = requests.iter().find(|r| r.signed_artifact.is_none()) {
        return SignatureCheck::MissingArtifact(unsigned.document_type);
    }

    SignatureCheck::AllSigned
}

pub fn is_overdue(request: &SignatureRequest, now: DateTime<Utc>) -> bool {
    matches!(request.status, SignatureStatus::Pending | SignatureStatus::Sent) && now >= request.expires_at
}

/// A reminder is due once per configured threshold crossed, up to `max_reminders`
pub fn reminder_due(request: &SignatureRequest, settings: &SignatureSettings, now: DateTime<Utc>) -> bool {
    if request.status != SignatureStatus::Sent || now >= request.expires_at {
        return false;
    }
    if request.reminders_sent >= settings.max_reminders {
        return false;
    }

    let remaining = request.expires_at - now;
    let thresholds_crossed = settings
        .reminder_days
        .iter()
        .filter(|days| remaining <= Duration::days(**days))
        .count() as u32;
    thresholds_crossed > request.reminders_sent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent_request(now: DateTime<Utc>) -> SignatureRequest {
        issue_request(
            &SessionId::from("CWS-1"),
            "user-1",
            DocumentType::Nda,
            "<html>NDA</html>".to_string(),
            &SignatureSettings::default(),
            now,
        )
    }

    fn artifact(now: DateTime<Utc>) -> SignedArtifact {
        SignedArtifact {
            signature_blob: "sig".to_string(),
            timestamp: now,
            device_info: "test".to_string(),
            ip_address: "127.0.0.1".to_string(),
            location: None,
        }
    }

    #[test]
    fn test_issued_request_is_sent_with_seven_day_expiry() {
        let now = Utc::now();
        let request = sent_request(now);

        assert_eq!(request.status, SignatureStatus::Sent);
        assert_eq!(request.expires_at - now, Duration::days(7));
        assert!(request.id.0.starts_with("SIG-"));
        assert!(request.token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(request.signature_url.ends_with(&request.token));
    }

    #[test]
    fn test_repeated_outcome_is_duplicate() {
        let now = Utc::now();
        let mut request = sent_request(now);

        assert_eq!(
            apply_outcome(&mut request, SignatureOutcome::Signed, Some(artifact(now)), now),
            CallbackEffect::Updated
        );
        assert_eq!(
            apply_outcome(&mut request, SignatureOutcome::Signed, Some(artifact(now)), now),
            CallbackEffect::Duplicate
        );
        assert_eq!(request.status, SignatureStatus::Signed);
    }

    #[test]
    fn test_decline_after_sign_is_contradiction() {
        let now = Utc::now();
        let mut request = sent_request(now);
        apply_outcome(&mut request, SignatureOutcome::Signed, Some(artifact(now)), now);

        assert_eq!(
            apply_outcome(&mut request, SignatureOutcome::Declined, None, now),
            CallbackEffect::Contradiction
        );
        assert_eq!(request.status, SignatureStatus::Signed);
    }

    #[test]
    fn test_sign_after_decline_is_ignored() {
        let now = Utc::now();
        let mut request = sent_request(now);
        apply_outcome(&mut request, SignatureOutcome::Declined, None, now);

        assert_eq!(
            apply_outcome(&mut request, SignatureOutcome::Signed, Some(artifact(now)), now),
            CallbackEffect::Ignored
        );
        assert_eq!(request.status, SignatureStatus::Declined);
    }

    #[test]
    fn test_check_required_reports_outstanding_documents() {
        let now = Utc::now();
        let nda = sent_request(now);
        assert_eq!(
            check_required(&[&nda]),
            SignatureCheck::Outstanding(vec![DocumentType::ContractorAgreement, DocumentType::Nda])
        );
    }

    #[test]
    fn test_check_required_needs_artifacts() {
        let now = Utc::now();
        let mut agreement = sent_request(now);
        agreement.document_type = DocumentType::ContractorAgreement;
        let mut nda = sent_request(now);
        apply_outcome(&mut agreement, SignatureOutcome::Signed, Some(artifact(now)), now);
        apply_outcome(&mut nda, SignatureOutcome::Signed, None, now);

        assert_eq!(
            check_required(&[&agreement, &nda]),
            SignatureCheck::MissingArtifact(DocumentType::Nda)
        );
    }

    #[test]
    fn test_reminder_schedule() {
        let now = Utc::now();
        let settings = SignatureSettings::default();
        let mut request = sent_request(now);

        assert!(!reminder_due(&request, &settings, now + Duration::days(1)));
        assert!(reminder_due(&request, &settings, now + Duration::days(4)));

        request.reminders_sent = 1;
        assert!(!reminder_due(&request, &settings, now + Duration::days(5)));
        assert!(reminder_due(&request, &settings, now + Duration::days(6)));

        request.reminders_sent = 2;
        assert!(!reminder_due(&request, &settings, now + Duration::hours(167)));
        assert!(!reminder_due(&request, &settings, now + Duration::days(8)));
    }

    #[test]
    fn test_overdue_only_for_open_requests() {
        let now = Utc::now();
        let mut request = sent_request(now);
        assert!(!is_overdue(&request, now + Duration::days(6)));
        assert!(is_overdue(&request, now + Duration::days(7)));

        request.status = SignatureStatus::Signed;
        assert!(!is_overdue(&request, now + Duration::days(30)));
    }
}
