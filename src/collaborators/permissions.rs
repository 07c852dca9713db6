use super::{CollaboratorError, PermissionCatalog, RolePermissions};
use crate::types::ContractorRole;

/// Built-in section and training tables for the two contractor roles
#[derive(Debug, Default, Clone)]
pub struct StaticPermissionCatalog;

impl StaticPermissionCatalog {
    pub fn new() -> Self {
        Self
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PermissionCatalog for StaticPermissionCatalog {
    fn sections_for(&self, role: ContractorRole) -> Result<RolePermissions, CollaboratorError> {
        let permissions = match role {
            ContractorRole::Dispatcher => RolePermissions {
                initial: owned(&["dashboard.view", "dispatch.view", "loads.view", "drivers.view"]),
                full: owned(&[
                    "dashboard.view",
                    "dispatch.access",
                    "dispatch.create-load",
                    "dispatch.assign-drivers",
                    "loads.manage",
                    "drivers.manage",
                    "communication.access",
                ]),
            },
            ContractorRole::BrokerAgent => RolePermissions {
                initial: owned(&["dashboard.view", "broker.view", "customers.view", "rates.view"]),
                full: owned(&[
                    "dashboard.view",
                    "broker.access",
                    "broker.create-load",
                    "broker.rate-negotiation",
                    "customers.manage",
                    "rates.manage",
                    "communication.access",
                ]),
            },
        };
        Ok(permissions)
    }

    fn required_training(&self, role: ContractorRole) -> Result<Vec<String>, CollaboratorError> {
        let modules = match role {
            ContractorRole::Dispatcher => owned(&[
                "dispatch_fundamentals",
                "load_management",
                "driver_communication",
                "safety_protocols",
                "system_navigation",
            ]),
            ContractorRole::BrokerAgent => owned(&[
                "broker_fundamentals",
                "rate_negotiation",
                "customer_relations",
                "contract_management",
                "system_navigation",
            ]),
        };
        Ok(modules)
    }
}
