// Shared onboarding data model - types that cross the dispatcher/orchestrator boundary

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a workflow session (`CWS-...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Unique identifier of a signature request (`SIG-...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignatureId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        SessionId(value.to_string())
    }
}

impl From<&str> for SignatureId {
    fn from(value: &str) -> Self {
        SignatureId(value.to_string())
    }
}

/// Roles that are eligible for contractor onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractorRole {
    #[serde(rename = "Dispatcher")]
    Dispatcher,
    #[serde(rename = "Broker Agent")]
    BrokerAgent,
}

impl ContractorRole {
    pub const ALL: [ContractorRole; 2] = [ContractorRole::Dispatcher, ContractorRole::BrokerAgent];

    /// Parse a free-form role name; anything other than the two contractor roles is ineligible
    pub fn parse(role: &str) -> Option<Self> {
        match role.trim() {
            "Dispatcher" => Some(ContractorRole::Dispatcher),
            "Broker Agent" => Some(ContractorRole::BrokerAgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractorRole::Dispatcher => "Dispatcher",
            ContractorRole::BrokerAgent => "Broker Agent",
        }
    }
}

impl fmt::Display for ContractorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The person being onboarded, as known to the user-provisioning subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub hire_date: NaiveDate,
}

impl SubjectProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Where a trigger came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    UserCreation,
    RoleChange,
    Manual,
}

impl TriggerSource {
    pub fn is_manual(&self) -> bool {
        matches!(self, TriggerSource::Manual)
    }
}

/// Immutable record of one triggering occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub id: String,
    pub subject: SubjectProfile,
    pub role: String,
    pub source: TriggerSource,
    pub triggered_by: String,
    pub triggered_at: DateTime<Utc>,
}

impl TriggerEvent {
    pub fn new(subject: SubjectProfile, role: impl Into<String>, source: TriggerSource, triggered_by: impl Into<String>) -> Self {
        Self {
            id: format!("TRG-{}", uuid::Uuid::new_v4().simple()),
            subject,
            role: role.into(),
            source,
            triggered_by: triggered_by.into(),
            triggered_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
    System,
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
            NotificationChannel::System => "system",
        };
        f.write_str(name)
    }
}

/// Audit record of a message handed to the notification transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub channel: NotificationChannel,
    pub recipient: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub delivered: bool,
}
