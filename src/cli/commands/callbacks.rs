use anyhow::Result;
use std::path::PathBuf;

use super::{read_json, Command, Engine};
use crate::workflow::{AdvanceOutcome, CallbackOutcome, SignatureWebhook, TrainingCompletion};

pub struct SignatureCommand {
    pub file: PathBuf,
}

impl Command for SignatureCommand {
    async fn execute(&self, engine: &Engine) -> Result<()> {
        let webhook: SignatureWebhook = read_json(&self.file)?;
        let outcome = engine.orchestrator.apply_signature_callback(webhook).await;
        report(&outcome);
        Ok(())
    }
}

pub struct TrainingCommand {
    pub file: PathBuf,
}

impl Command for TrainingCommand {
    async fn execute(&self, engine: &Engine) -> Result<()> {
        let completion: TrainingCompletion = read_json(&self.file)?;
        let outcome = engine
            .orchestrator
            .apply_training_completion(&completion.subject_id, &completion.module_id)
            .await;
        report(&outcome);
        Ok(())
    }
}

pub(crate) fn describe_progress(progress: &AdvanceOutcome) -> String {
    match progress {
        AdvanceOutcome::Completed => "onboarding completed".to_string(),
        AdvanceOutcome::Blocked { step } => format!("waiting at {step}"),
        AdvanceOutcome::RetryScheduled { step, attempt, backoff } => format!(
            "{step} failed (attempt {attempt}), retry with `onboard advance` after {}s",
            backoff.as_secs()
        ),
        AdvanceOutcome::Failed { step, reason } => format!("failed at {step}: {reason}"),
        AdvanceOutcome::Cancelled => "session cancelled".to_string(),
    }
}

fn report(outcome: &CallbackOutcome) {
    match outcome {
        CallbackOutcome::Applied { session_id, progress } => {
            println!("✅ Applied to {session_id}: {}", describe_progress(progress))
        }
        CallbackOutcome::Duplicate { session_id } => {
            println!("🔁 Already applied to {session_id}, nothing changed")
        }
        CallbackOutcome::Ignored { session_id, reason } => println!("⚠️  Ignored for {session_id}: {reason}"),
        CallbackOutcome::SessionClosed { session_id, status } => {
            println!("🔒 Session {session_id} is {status}, callback ignored")
        }
        CallbackOutcome::UnknownSignature => println!("❓ No session owns that signature request"),
        CallbackOutcome::UnknownSubject => println!("❓ No onboarding session for that subject"),
    }
}
