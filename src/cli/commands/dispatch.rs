use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{print_json, read_json, Command, Engine};
use crate::dispatch::{TriggerLog, TriggerOutcome};
use crate::types::{SubjectProfile, TriggerEvent, TriggerSource};

/// Event payload as delivered by the user-management system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerInput {
    pub subject: SubjectProfile,
    pub role: String,
    #[serde(default = "default_source")]
    pub source: TriggerSource,
    pub triggered_by: String,
}

fn default_source() -> TriggerSource {
    TriggerSource::UserCreation
}

impl From<TriggerInput> for TriggerEvent {
    fn from(input: TriggerInput) -> Self {
        TriggerEvent::new(input.subject, input.role, input.source, input.triggered_by)
    }
}

pub struct DispatchCommand {
    pub file: PathBuf,
}

impl Command for DispatchCommand {
    async fn execute(&self, engine: &Engine) -> Result<()> {
        let input: TriggerInput = read_json(&self.file)?;
        let entry = engine.dispatcher.dispatch(input.into()).await;
        report(&entry)
    }
}

pub struct ManualCommand {
    pub subject: PathBuf,
    pub role: String,
    pub actor: String,
}

impl Command for ManualCommand {
    async fn execute(&self, engine: &Engine) -> Result<()> {
        let subject: SubjectProfile = read_json(&self.subject)?;
        let entry = engine
            .dispatcher
            .manual_dispatch(subject, &self.role, &self.actor)
            .await;
        report(&entry)
    }
}

fn report(entry: &TriggerLog) -> Result<()> {
    match entry.outcome {
        TriggerOutcome::Success => println!(
            "✅ Onboarding started: session {}",
            entry.session_id.as_ref().map(|id| id.0.as_str()).unwrap_or("-")
        ),
        TriggerOutcome::Skipped => println!(
            "⏭️  Skipped: {}",
            entry.skip_reason.as_deref().unwrap_or("policy")
        ),
        TriggerOutcome::ApprovalRequested => println!("⏸️  Waiting for administrator approval"),
        TriggerOutcome::Failure => println!(
            "❌ Dispatch failed: {}",
            entry.error.as_deref().unwrap_or("unknown error")
        ),
    }
    print_json(entry)
}
