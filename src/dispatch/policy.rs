use crate::config::DispatcherConfig;
use crate::types::TriggerEvent;

/// Filtering rules applied to automatic trigger events
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPolicy {
    pub enabled: bool,
    pub qualifying_roles: Vec<String>,
    pub require_approval: bool,
    pub notify_compliance: bool,
    pub compliance_recipient: Option<String>,
    pub admin_recipients: Vec<String>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::from_config(&crate::config::OnboardingConfig::default().dispatcher)
    }
}

/// What the policy says to do with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Proceed,
    Skip(String),
    RequireApproval,
}

impl DispatchPolicy {
    pub fn from_config(config: &DispatcherConfig) -> Self {
        Self {
            enabled: config.enabled,
            qualifying_roles: config.qualifying_roles.clone(),
            require_approval: config.require_approval,
            notify_compliance: config.notify_compliance,
            compliance_recipient: config.compliance_recipient.clone(),
            admin_recipients: config.admin_recipients.clone(),
        }
    }

    pub fn qualifies(&self, role: &str) -> bool {
        let role = role.trim();
        self.qualifying_roles.iter().any(|r| r == role)
    }

    /// Manual events bypass the enabled flag, the role filter and the approval gate
    pub fn evaluate(&self, event: &TriggerEvent) -> PolicyDecision {
        if event.source.is_manual() {
            return PolicyDecision::Proceed;
        }
        if !self.enabled {
            return PolicyDecision::Skip("automatic dispatch is disabled".to_string());
        }
        if !self.qualifies(&event.role) {
            return PolicyDecision::Skip(format!("role {} does not qualify for contractor onboarding", event.role));
        }
        if self.require_approval {
            return PolicyDecision::RequireApproval;
        }
        PolicyDecision::Proceed
    }

    /// Compliance copy recipient, when enabled and configured
    pub fn compliance_target(&self) -> Option<&str> {
        if !self.notify_compliance {
            return None;
        }
        self.compliance_recipient.as_deref().filter(|r| !r.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SubjectProfile, TriggerSource};
    use chrono::NaiveDate;

    fn event(role: &str, source: TriggerSource) -> TriggerEvent {
        TriggerEvent::new(
            SubjectProfile {
                user_id: "user-1".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Park".to_string(),
                email: "ada@example.com".to_string(),
                phone: String::new(),
                department: "Brokerage".to_string(),
                hire_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            },
            role,
            source,
            "hr-system",
        )
    }

    #[test]
    fn test_non_qualifying_role_is_skipped() {
        let policy = DispatchPolicy::default();
        assert!(matches!(
            policy.evaluate(&event("Driver", TriggerSource::UserCreation)),
            PolicyDecision::Skip(_)
        ));
        assert_eq!(
            policy.evaluate(&event("Broker Agent", TriggerSource::RoleChange)),
            PolicyDecision::Proceed
        );
    }

    #[test]
    fn test_approval_gate_only_for_automatic_events() {
        let policy = DispatchPolicy {
            require_approval: true,
            ..DispatchPolicy::default()
        };
        assert_eq!(
            policy.evaluate(&event("Dispatcher", TriggerSource::UserCreation)),
            PolicyDecision::RequireApproval
        );
        assert_eq!(
            policy.evaluate(&event("Dispatcher", TriggerSource::Manual)),
            PolicyDecision::Proceed
        );
    }

    #[test]
    fn test_disabled_dispatcher_skips_automatic_events() {
        let policy = DispatchPolicy {
            enabled: false,
            ..DispatchPolicy::default()
        };
        assert!(matches!(
            policy.evaluate(&event("Dispatcher", TriggerSource::UserCreation)),
            PolicyDecision::Skip(reason) if reason.contains("disabled")
        ));
    }

    #[test]
    fn test_compliance_target_requires_flag_and_recipient() {
        let mut policy = DispatchPolicy {
            compliance_recipient: Some("hr@example.com".to_string()),
            ..DispatchPolicy::default()
        };
        assert_eq!(policy.compliance_target(), None);

        policy.notify_compliance = true;
        assert_eq!(policy.compliance_target(), Some("hr@example.com"));
    }
}
