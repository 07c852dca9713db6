use anyhow::Result;

use super::callbacks::describe_progress;
use super::{Command, Engine};
use crate::types::SessionId;

pub struct AdvanceCommand {
    pub session_id: String,
}

impl Command for AdvanceCommand {
    async fn execute(&self, engine: &Engine) -> Result<()> {
        let session_id = SessionId::from(self.session_id.as_str());
        let outcome = engine.orchestrator.advance(&session_id).await?;
        println!("🔄 {session_id}: {}", describe_progress(&outcome));
        Ok(())
    }
}

pub struct CancelCommand {
    pub session_id: String,
    pub actor: String,
    pub reason: String,
}

impl Command for CancelCommand {
    async fn execute(&self, engine: &Engine) -> Result<()> {
        let session_id = SessionId::from(self.session_id.as_str());
        let session = engine
            .orchestrator
            .cancel_session(&session_id, &self.actor, &self.reason)
            .await?;
        println!(
            "🛑 Cancelled {} for {} ({} signature request(s) withdrawn)",
            session.id,
            session.trigger.subject.full_name(),
            session
                .signature_requests
                .iter()
                .filter(|r| r.status == crate::workflow::SignatureStatus::Cancelled)
                .count()
        );
        Ok(())
    }
}
