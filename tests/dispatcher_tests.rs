//! Trigger dispatcher behaviour: policy filtering, approval, manual starts,
//! start notifications and statistics.

use chrono::{Duration, Utc};

mod fixtures;

use contractor_onboarding::dispatch::{DispatchPolicy, StatisticsWindow, TriggerOutcome};
use contractor_onboarding::types::{NotificationChannel, TriggerSource};
use contractor_onboarding::workflow::SessionStatus;
use fixtures::{subject, user_created, TestEngine, ADMIN};

#[tokio::test]
async fn test_non_qualifying_role_is_skipped_without_session() {
    let engine = TestEngine::new();
    let entry = engine.dispatcher.dispatch(user_created("user-200", "Driver")).await;

    assert_eq!(entry.outcome, TriggerOutcome::Skipped);
    assert!(entry.session_id.is_none());
    assert!(entry.error.is_none());
    assert!(entry.skip_reason.unwrap().contains("Driver"));
    assert!(engine.sessions.is_empty().await);
    assert_eq!(engine.log.len().await, 1);
}

#[tokio::test]
async fn test_disabled_dispatcher_skips_automatic_events() {
    let engine = TestEngine::builder()
        .policy(DispatchPolicy {
            enabled: false,
            ..DispatchPolicy::default()
        })
        .build();

    let automatic = engine.dispatcher.dispatch(user_created("user-201", "Dispatcher")).await;
    assert_eq!(automatic.outcome, TriggerOutcome::Skipped);

    let manual = engine
        .dispatcher
        .manual_dispatch(subject("user-201"), "Dispatcher", "admin@example.com")
        .await;
    assert_eq!(manual.outcome, TriggerOutcome::Success);
}

#[tokio::test]
async fn test_approval_required_notifies_admins_and_creates_nothing() {
    let engine = TestEngine::builder()
        .policy(DispatchPolicy {
            require_approval: true,
            ..DispatchPolicy::default()
        })
        .build();

    let entry = engine.dispatcher.dispatch(user_created("user-202", "Broker Agent")).await;

    assert_eq!(entry.outcome, TriggerOutcome::ApprovalRequested);
    assert!(entry.session_id.is_none());
    assert!(engine.sessions.is_empty().await);
    assert_eq!(entry.notifications.len(), 1);
    assert_eq!(entry.notifications[0].channel, NotificationChannel::System);
    assert_eq!(entry.notifications[0].recipient, ADMIN);
    assert!(entry.notifications[0].message.starts_with("Approval required"));
}

#[tokio::test]
async fn test_manual_dispatch_bypasses_role_filter_and_approval() {
    let engine = TestEngine::builder()
        .policy(DispatchPolicy {
            require_approval: true,
            qualifying_roles: vec!["Dispatcher".to_string()],
            ..DispatchPolicy::default()
        })
        .build();

    let entry = engine
        .dispatcher
        .manual_dispatch(subject("user-203"), "Broker Agent", "ops-lead")
        .await;

    assert_eq!(entry.outcome, TriggerOutcome::Success);
    assert_eq!(entry.event.source, TriggerSource::Manual);
    assert_eq!(entry.event.triggered_by, "ops-lead");

    let session = engine
        .orchestrator
        .session(entry.session_id.as_ref().unwrap())
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.identifiers.unwrap().department_code, "BB");
}

#[tokio::test]
async fn test_start_fans_out_notifications() {
    let engine = TestEngine::builder()
        .policy(DispatchPolicy {
            notify_compliance: true,
            compliance_recipient: Some("compliance@example.com".to_string()),
            ..DispatchPolicy::default()
        })
        .build();

    let entry = engine.dispatcher.dispatch(user_created("user-204", "Dispatcher")).await;
    assert_eq!(entry.outcome, TriggerOutcome::Success);

    let recipients: Vec<&str> = entry.notifications.iter().map(|n| n.recipient.as_str()).collect();
    assert_eq!(
        recipients,
        vec!["user-204@contractors.example.com", ADMIN, "compliance@example.com"]
    );
    assert!(entry.notifications[0].message.contains("Welcome aboard, Sarah"));
    assert!(entry.notifications[1]
        .message
        .contains(&entry.session_id.as_ref().unwrap().to_string()));
}

#[tokio::test]
async fn test_second_trigger_for_active_subject_is_a_failure() {
    let engine = TestEngine::new();
    let first = engine.dispatcher.dispatch(user_created("user-205", "Dispatcher")).await;
    let second = engine.dispatcher.dispatch(user_created("user-205", "Dispatcher")).await;

    assert_eq!(first.outcome, TriggerOutcome::Success);
    assert_eq!(second.outcome, TriggerOutcome::Failure);
    assert!(second
        .notifications
        .iter()
        .any(|n| n.recipient == ADMIN && n.message.contains("Manual intervention required")));
    assert_eq!(engine.sessions.len().await, 1);
}

#[tokio::test]
async fn test_statistics_by_outcome_role_and_window() {
    let engine = TestEngine::builder()
        .policy(DispatchPolicy {
            qualifying_roles: vec!["Dispatcher".to_string()],
            ..DispatchPolicy::default()
        })
        .build();

    engine.dispatcher.dispatch(user_created("user-206", "Dispatcher")).await;
    engine.dispatcher.dispatch(user_created("user-207", "Dispatcher")).await;
    engine.dispatcher.dispatch(user_created("user-208", "Broker Agent")).await;
    engine
        .dispatcher
        .manual_dispatch(subject("user-209"), "Driver", "ops-lead")
        .await;

    let mut old = user_created("user-210", "Dispatcher");
    old.triggered_at = Utc::now() - Duration::days(30);
    engine.dispatcher.dispatch(old).await;

    let all = engine.dispatcher.statistics(None).await;
    assert_eq!(all.counts.total, 5);
    assert_eq!(all.counts.success, 3);
    assert_eq!(all.counts.skipped, 1);
    assert_eq!(all.counts.failure, 1);
    assert_eq!(all.by_role["Dispatcher"].success, 3);
    assert_eq!(all.by_role["Broker Agent"].skipped, 1);
    assert_eq!(all.by_role["Driver"].failure, 1);

    let recent = engine
        .dispatcher
        .statistics(Some(StatisticsWindow::trailing(Duration::days(1))))
        .await;
    assert_eq!(recent.counts.total, 4);
    assert_eq!(recent.by_role["Dispatcher"].success, 2);
    assert!(recent.average_duration_ms >= 0.0);
}

#[tokio::test]
async fn test_log_entries_are_recorded_in_order() {
    let engine = TestEngine::new();
    let first = engine.dispatcher.dispatch(user_created("user-211", "Dispatcher")).await;
    let second = engine.dispatcher.dispatch(user_created("user-212", "Driver")).await;

    let entries = engine.log.entries().await;
    assert_eq!(entries, vec![first, second]);
}

#[tokio::test]
async fn test_subject_with_non_latin_name_is_onboarded() {
    let engine = TestEngine::new();
    let mut event = user_created("user-213", "Dispatcher");
    event.subject.first_name = "美玲".to_string();
    event.subject.last_name = "王".to_string();

    let entry = engine.dispatcher.dispatch(event).await;

    assert_eq!(entry.outcome, TriggerOutcome::Success);
    assert!(entry.error.is_none());
    let session = engine
        .orchestrator
        .session(entry.session_id.as_ref().unwrap())
        .await
        .unwrap();
    assert_eq!(session.identifiers.unwrap().user_id, "美王-DC-2024014");
}
