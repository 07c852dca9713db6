// Property-Based Testing for onboarding sessions
// Retry bound, callback ordering and role filtering under generated inputs

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;
use std::sync::Arc;

mod fixtures;

use contractor_onboarding::dispatch::TriggerOutcome;
use contractor_onboarding::workflow::{
    AdvanceOutcome, SessionStatus, SignatureOutcome, StepKind, StepStatus, WorkflowSession,
};
use fixtures::{user_created, webhook, FlakyRenderer, TestEngine};

const MODULES: [&str; 5] = [
    "dispatch_fundamentals",
    "load_management",
    "driver_communication",
    "safety_protocols",
    "system_navigation",
];

#[derive(Debug, Clone, Arbitrary)]
enum Callback {
    Sign(#[proptest(strategy = "0usize..2")] usize),
    Train(#[proptest(strategy = "0usize..5")] usize),
}

fn role_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Dispatcher".to_string()),
        Just("Broker Agent".to_string()),
        Just("Driver".to_string()),
        Just("Admin".to_string()),
        "[A-Za-z]{1,8}( [A-Za-z]{1,8})?",
    ]
}

fn check_invariants(session: &WorkflowSession) -> Result<(), TestCaseError> {
    for step in &session.steps {
        if matches!(step.status, StepStatus::InProgress | StepStatus::Completed) {
            prop_assert!(session.dependencies_met(step), "{} ran early", step.id);
        }
        prop_assert!(step.retry_count <= step.max_retries.max(1));
    }
    let all_completed = session.steps.iter().all(|s| s.status == StepStatus::Completed);
    let any_failed = session.steps.iter().any(|s| s.status == StepStatus::Failed);
    prop_assert_eq!(session.status == SessionStatus::Completed, all_completed);
    prop_assert_eq!(session.status == SessionStatus::Failed, any_failed);
    prop_assert_eq!(
        session.training.all_completed,
        session.training.required.iter().all(|m| session.training.completed.contains(m))
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Document generation allows two attempts: the step fails exactly when the
    /// retry count reaches that budget, never before and never after
    #[test]
    fn prop_retry_bound(failures in 0u32..5) {
        tokio_test::block_on(async {
            let renderer = Arc::new(FlakyRenderer::new(failures));
            let engine = TestEngine::builder().documents(renderer.clone()).build();
            let entry = engine.dispatcher.dispatch(user_created("user-300", "Dispatcher")).await;
            let session_id = entry.session_id.unwrap();

            let mut outcome = engine.orchestrator.advance(&session_id).await.unwrap();
            let mut advances = 0;
            while matches!(outcome, AdvanceOutcome::RetryScheduled { .. }) && advances < 10 {
                outcome = engine.orchestrator.advance(&session_id).await.unwrap();
                advances += 1;
            }

            let session = engine.orchestrator.session(&session_id).await.unwrap();
            let generation = session.step(StepKind::DocumentGeneration).unwrap();
            check_invariants(&session)?;

            if failures < generation.max_retries {
                prop_assert_eq!(outcome, AdvanceOutcome::Blocked { step: StepKind::SignatureValidation });
                prop_assert_eq!(generation.retry_count, failures);
                prop_assert_eq!(generation.status, StepStatus::Completed);
            } else {
                let failed_at_generation = matches!(
                    outcome,
                    AdvanceOutcome::Failed { step: StepKind::DocumentGeneration, .. }
                );
                prop_assert!(failed_at_generation);
                prop_assert_eq!(generation.retry_count, generation.max_retries);
                prop_assert_eq!(renderer.calls(), generation.max_retries);
                prop_assert_eq!(session.status, SessionStatus::Failed);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Any interleaving of signed and training callbacks, duplicates included,
    /// leaves the session where a simple model says it should be
    #[test]
    fn prop_callback_ordering(callbacks in prop::collection::vec(any::<Callback>(), 0..30)) {
        tokio_test::block_on(async {
            let engine = TestEngine::new();
            let entry = engine.dispatcher.dispatch(user_created("user-301", "Dispatcher")).await;
            let session_id = entry.session_id.unwrap();
            let requests = engine.orchestrator.session(&session_id).await.unwrap().signature_requests;

            let mut signed = BTreeSet::new();
            let mut trained = BTreeSet::new();
            for callback in &callbacks {
                match callback {
                    Callback::Sign(index) => {
                        engine
                            .orchestrator
                            .apply_signature_callback(webhook(&requests[*index], SignatureOutcome::Signed))
                            .await;
                        signed.insert(*index);
                    }
                    Callback::Train(index) => {
                        engine
                            .orchestrator
                            .apply_training_completion("user-301", MODULES[*index])
                            .await;
                        // completions before assignment are dropped
                        if signed.len() == 2 {
                            trained.insert(*index);
                        }
                    }
                }
                let session = engine.orchestrator.session(&session_id).await.unwrap();
                check_invariants(&session)?;
            }

            let session = engine.orchestrator.session(&session_id).await.unwrap();
            let expected_status = if signed.len() == 2 && trained.len() == MODULES.len() {
                SessionStatus::Completed
            } else {
                SessionStatus::Active
            };
            prop_assert_eq!(session.status, expected_status);

            let validation = session.step_status(StepKind::SignatureValidation).unwrap();
            if signed.len() == 2 {
                prop_assert_eq!(validation, StepStatus::Completed);
                prop_assert_eq!(session.training.completed.len(), trained.len());
            } else {
                prop_assert_eq!(validation, StepStatus::InProgress);
                prop_assert!(session.training.completed.is_empty());
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Only qualifying roles produce sessions
    #[test]
    fn prop_role_filter(role in role_strategy()) {
        tokio_test::block_on(async {
            let engine = TestEngine::new();
            let entry = engine.dispatcher.dispatch(user_created("user-302", &role)).await;
            let qualifies = role == "Dispatcher" || role == "Broker Agent";

            if qualifies {
                prop_assert_eq!(entry.outcome, TriggerOutcome::Success);
                prop_assert_eq!(engine.sessions.len().await, 1);
            } else {
                prop_assert_eq!(entry.outcome, TriggerOutcome::Skipped);
                prop_assert!(engine.sessions.is_empty().await);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
