use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Notification, SessionId, TriggerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    Success,
    Failure,
    Skipped,
    ApprovalRequested,
}

impl std::fmt::Display for TriggerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TriggerOutcome::Success => "success",
            TriggerOutcome::Failure => "failure",
            TriggerOutcome::Skipped => "skipped",
            TriggerOutcome::ApprovalRequested => "approval_requested",
        };
        f.write_str(name)
    }
}

/// One dispatch attempt. Never mutated once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerLog {
    pub id: String,
    pub event: TriggerEvent,
    pub outcome: TriggerOutcome,
    pub session_id: Option<SessionId>,
    pub error: Option<String>,
    pub skip_reason: Option<String>,
    pub duration_ms: u64,
    /// Notifications the dispatcher itself emitted for this attempt
    pub notifications: Vec<Notification>,
    pub recorded_at: DateTime<Utc>,
}

/// Inclusive range over event timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatisticsWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window ending now and reaching back `duration`
    pub fn trailing(duration: chrono::Duration) -> Self {
        let end = Utc::now();
        Self {
            start: end - duration,
            end,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
    pub approval_requested: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: TriggerOutcome) {
        self.total += 1;
        match outcome {
            TriggerOutcome::Success => self.success += 1,
            TriggerOutcome::Failure => self.failure += 1,
            TriggerOutcome::Skipped => self.skipped += 1,
            TriggerOutcome::ApprovalRequested => self.approval_requested += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchStatistics {
    pub window: Option<StatisticsWindow>,
    pub counts: OutcomeCounts,
    pub by_role: BTreeMap<String, OutcomeCounts>,
    pub average_duration_ms: f64,
}
