use std::collections::BTreeMap;

use super::types::{DispatchStatistics, OutcomeCounts, StatisticsWindow, TriggerLog};

/// Aggregate log entries whose event timestamp falls inside `window`, or all entries
pub fn summarize(entries: &[TriggerLog], window: Option<StatisticsWindow>) -> DispatchStatistics {
    let selected: Vec<&TriggerLog> = entries
        .iter()
        .filter(|entry| window.map_or(true, |w| w.contains(entry.event.triggered_at)))
        .collect();

    let mut counts = OutcomeCounts::default();
    let mut by_role: BTreeMap<String, OutcomeCounts> = BTreeMap::new();
    let mut total_duration: u64 = 0;

    for entry in &selected {
        counts.record(entry.outcome);
        by_role
            .entry(entry.event.role.clone())
            .or_default()
            .record(entry.outcome);
        total_duration += entry.duration_ms;
    }

    let average_duration_ms = if selected.is_empty() {
        0.0
    } else {
        total_duration as f64 / selected.len() as f64
    };

    DispatchStatistics {
        window,
        counts,
        by_role,
        average_duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::TriggerOutcome;
    use crate::types::{SubjectProfile, TriggerEvent, TriggerSource};
    use chrono::{Duration, NaiveDate, Utc};

    fn entry(role: &str, outcome: TriggerOutcome, duration_ms: u64, age: Duration) -> TriggerLog {
        let mut event = TriggerEvent::new(
            SubjectProfile {
                user_id: format!("user-{duration_ms}"),
                first_name: "Lee".to_string(),
                last_name: "Chen".to_string(),
                email: "lee@example.com".to_string(),
                phone: String::new(),
                department: "Dispatch".to_string(),
                hire_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            },
            role,
            TriggerSource::UserCreation,
            "hr-system",
        );
        event.triggered_at = Utc::now() - age;
        TriggerLog {
            id: format!("LOG-{duration_ms}"),
            event,
            outcome,
            session_id: None,
            error: None,
            skip_reason: None,
            duration_ms,
            notifications: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_counts_and_role_breakdown() {
        let entries = vec![
            entry("Dispatcher", TriggerOutcome::Success, 10, Duration::zero()),
            entry("Dispatcher", TriggerOutcome::Failure, 30, Duration::zero()),
            entry("Driver", TriggerOutcome::Skipped, 2, Duration::zero()),
        ];

        let stats = summarize(&entries, None);
        assert_eq!(stats.counts.total, 3);
        assert_eq!(stats.counts.success, 1);
        assert_eq!(stats.counts.failure, 1);
        assert_eq!(stats.counts.skipped, 1);
        assert_eq!(stats.by_role["Dispatcher"].total, 2);
        assert_eq!(stats.by_role["Driver"].skipped, 1);
        assert!((stats.average_duration_ms - 14.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_window_filters_on_event_time() {
        let entries = vec![
            entry("Dispatcher", TriggerOutcome::Success, 10, Duration::days(10)),
            entry("Broker Agent", TriggerOutcome::ApprovalRequested, 4, Duration::hours(1)),
        ];

        let stats = summarize(&entries, Some(StatisticsWindow::trailing(Duration::days(1))));
        assert_eq!(stats.counts.total, 1);
        assert_eq!(stats.counts.approval_requested, 1);
        assert!(!stats.by_role.contains_key("Dispatcher"));
    }

    #[test]
    fn test_empty_log_has_zero_average() {
        let stats = summarize(&[], None);
        assert_eq!(stats.counts, OutcomeCounts::default());
        assert_eq!(stats.average_duration_ms, 0.0);
    }
}
