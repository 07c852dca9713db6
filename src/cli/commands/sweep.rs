use anyhow::Result;
use chrono::Utc;

use super::{Command, Engine};

/// Expiry first, so expired requests never get a reminder
pub struct SweepCommand;

impl Command for SweepCommand {
    async fn execute(&self, engine: &Engine) -> Result<()> {
        let now = Utc::now();
        let expired = engine.orchestrator.expire_overdue_signatures(now).await;
        let reminders = engine.orchestrator.send_signature_reminders(now).await;

        println!("🧹 Sweep complete");
        println!("   ⌛ Expired signature requests: {}", expired.len());
        for id in &expired {
            println!("      - {id}");
        }
        println!("   📨 Reminders sent: {reminders}");
        Ok(())
    }
}
