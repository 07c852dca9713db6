// Trigger intake: policy filtering, session start and the append-only dispatch log

pub mod dispatcher;
pub mod policy;
pub mod statistics;
pub mod types;

pub use dispatcher::TriggerDispatcher;
pub use policy::{DispatchPolicy, PolicyDecision};
pub use types::{DispatchStatistics, OutcomeCounts, StatisticsWindow, TriggerLog, TriggerOutcome};
