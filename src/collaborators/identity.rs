use chrono::Datelike;
use regex::Regex;
use std::sync::LazyLock;

use super::{CollaboratorError, IdentityRegistry, IdentityRequest, SubjectIdentifiers};

static NON_MAILBOX_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z]").expect("static regex is valid"));

/// Deterministic identifier registry.
///
/// User ids follow `<initials>-<department code>-<year><day of year>`,
/// e.g. Sarah Johnson, Dispatcher, hired 2024-01-14 -> `SJ-DC-2024014`.
#[derive(Debug, Default, Clone)]
pub struct RegistryIdentityService;

impl RegistryIdentityService {
    pub fn new() -> Self {
        Self
    }

    fn department_code(role: &str) -> String {
        match role.trim() {
            "Dispatcher" => "DC".to_string(),
            "Broker Agent" => "BB".to_string(),
            "Manager" => "MGR".to_string(),
            "Driver" => "DR".to_string(),
            "Admin" => "ADM".to_string(),
            "Viewer" => "VW".to_string(),
            other => other
                .split_whitespace()
                .filter_map(|word| word.chars().next())
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        }
    }

    fn security_level(role: &str) -> u8 {
        match role.trim() {
            "Admin" | "Manager" => 5,
            "Dispatcher" | "Broker Agent" => 3,
            "Driver" => 2,
            _ => 1,
        }
    }

    /// First letter of the name in any script, uppercased
    fn initial(name: &str) -> Option<String> {
        name.trim()
            .chars()
            .find(|c| c.is_alphabetic())
            .map(|c| c.to_uppercase().collect())
    }

    fn mailbox_part(name: &str) -> String {
        NON_MAILBOX_CHARS
            .replace_all(&name.to_lowercase(), "")
            .into_owned()
    }

    /// `first.last` in ascii, falling back to the department and hire date
    /// when neither name has ascii letters
    fn email_prefix(first: &str, last: &str, department_code: &str, hire_date_code: &str) -> String {
        let parts: Vec<String> = [first, last]
            .iter()
            .map(|name| Self::mailbox_part(name))
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            format!("{}.{hire_date_code}", department_code.to_lowercase())
        } else {
            parts.join(".")
        }
    }
}

impl IdentityRegistry for RegistryIdentityService {
    fn resolve(&self, request: &IdentityRequest) -> Result<SubjectIdentifiers, CollaboratorError> {
        let (Some(first), Some(last)) = (
            Self::initial(&request.first_name),
            Self::initial(&request.last_name),
        ) else {
            return Err(CollaboratorError::InvalidInput(format!(
                "cannot derive initials from '{} {}'",
                request.first_name, request.last_name
            )));
        };

        let department_code = Self::department_code(&request.role);
        if department_code.is_empty() {
            return Err(CollaboratorError::InvalidInput("role is empty".to_string()));
        }

        let initials = format!("{first}{last}");
        let hire_date_code = format!(
            "{}{:03}",
            request.hire_date.year(),
            request.hire_date.ordinal()
        );
        let user_id = format!("{initials}-{department_code}-{hire_date_code}");

        Ok(SubjectIdentifiers {
            system_id: format!("SYS-{user_id}"),
            employee_code: format!("EMP-{initials}-{department_code}"),
            access_code: format!("ACC-{initials}-{hire_date_code}"),
            email_prefix: Self::email_prefix(
                &request.first_name,
                &request.last_name,
                &department_code,
                &hire_date_code,
            ),
            security_level: Self::security_level(&request.role),
            user_id,
            initials,
            department_code,
            hire_date_code,
        })
    }
}
