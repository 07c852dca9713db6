// Fixed onboarding step graph

use std::collections::BTreeMap;

use super::types::{StepKind, StepStatus, WorkflowStep};

struct StepDefinition {
    kind: StepKind,
    name: &'static str,
    description: &'static str,
    dependencies: &'static [StepKind],
    automated: bool,
    max_retries: u32,
}

const STEP_DEFINITIONS: [StepDefinition; 8] = [
    StepDefinition {
        kind: StepKind::UserVerification,
        name: "User Verification",
        description: "Verify user identity and role requirements",
        dependencies: &[],
        automated: true,
        max_retries: 3,
    },
    StepDefinition {
        kind: StepKind::DocumentGeneration,
        name: "Document Generation",
        description: "Generate contractor agreement and NDA",
        dependencies: &[StepKind::UserVerification],
        automated: true,
        max_retries: 2,
    },
    StepDefinition {
        kind: StepKind::SignatureRequest,
        name: "Signature Request",
        description: "Send documents for electronic signature",
        dependencies: &[StepKind::DocumentGeneration],
        automated: true,
        max_retries: 1,
    },
    StepDefinition {
        kind: StepKind::SignatureValidation,
        name: "Signature Validation",
        description: "Validate received signatures",
        dependencies: &[StepKind::SignatureRequest],
        automated: true,
        max_retries: 2,
    },
    StepDefinition {
        kind: StepKind::SectionAccessCreation,
        name: "Section Access Creation",
        description: "Create initial section access permissions",
        dependencies: &[StepKind::SignatureValidation],
        automated: true,
        max_retries: 3,
    },
    StepDefinition {
        kind: StepKind::TrainingAssignment,
        name: "Training Assignment",
        description: "Assign required training modules",
        dependencies: &[StepKind::SectionAccessCreation],
        automated: true,
        max_retries: 2,
    },
    StepDefinition {
        kind: StepKind::AccessPending,
        name: "Access Pending Training",
        description: "Wait for training completion",
        dependencies: &[StepKind::TrainingAssignment],
        automated: false,
        max_retries: 0,
    },
    StepDefinition {
        kind: StepKind::FullAccessGrant,
        name: "Full Access Grant",
        description: "Grant full system access after training",
        dependencies: &[StepKind::AccessPending],
        automated: true,
        max_retries: 2,
    },
];

/// Fresh, all-pending step list with the fixed dependency wiring
pub fn standard_steps() -> Vec<WorkflowStep> {
    STEP_DEFINITIONS
        .iter()
        .enumerate()
        .map(|(index, def)| WorkflowStep {
            id: def.kind,
            name: def.name.to_string(),
            description: def.description.to_string(),
            order: (index + 1) as u8,
            dependencies: def.dependencies.to_vec(),
            automated: def.automated,
            status: StepStatus::Pending,
            retry_count: 0,
            max_retries: def.max_retries,
            started_at: None,
            completed_at: None,
            failure_reason: None,
            data: BTreeMap::new(),
        })
        .collect()
}
