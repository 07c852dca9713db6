use anyhow::{anyhow, Result};
use chrono::Duration;

use super::{print_json, Command, Engine};
use crate::dispatch::StatisticsWindow;
use crate::types::SessionId;
use crate::workflow::{SessionStatus, WorkflowSession};

pub struct StatusCommand {
    pub session_id: Option<String>,
    pub subject: Option<String>,
}

impl Command for StatusCommand {
    async fn execute(&self, engine: &Engine) -> Result<()> {
        if let Some(id) = &self.session_id {
            let session = engine
                .orchestrator
                .session(&SessionId::from(id.as_str()))
                .await
                .ok_or_else(|| anyhow!("Session not found: {id}"))?;
            return print_json(&session);
        }

        if let Some(subject) = &self.subject {
            let session = engine
                .orchestrator
                .active_session_for(subject)
                .await
                .ok_or_else(|| anyhow!("No active onboarding session for {subject}"))?;
            return print_json(&session);
        }

        let sessions = engine.orchestrator.sessions().await;
        println!("📋 ONBOARDING SESSIONS");
        println!("======================");
        if sessions.is_empty() {
            println!("No sessions yet. Start one with 'onboard dispatch <event.json>'");
            return Ok(());
        }
        for session in &sessions {
            println!("{}", summary_line(session));
        }

        let count = |status: SessionStatus| sessions.iter().filter(|s| s.status == status).count();
        println!();
        println!(
            "Active: {}  Completed: {}  Failed: {}  Cancelled: {}",
            count(SessionStatus::Active),
            count(SessionStatus::Completed),
            count(SessionStatus::Failed),
            count(SessionStatus::Cancelled)
        );
        Ok(())
    }
}

fn summary_line(session: &WorkflowSession) -> String {
    let position = match session.current_step() {
        Some(step) if !session.is_terminal() => format!("at {} ({:?})", step.id, step.status),
        _ => String::new(),
    };
    format!(
        "{:<32} {:<10} {:<24} {:<13} {}",
        session.id.0,
        session.status.to_string(),
        session.trigger.subject.full_name(),
        session.trigger.role,
        position
    )
}

pub struct StatsCommand {
    pub hours: Option<i64>,
}

impl Command for StatsCommand {
    async fn execute(&self, engine: &Engine) -> Result<()> {
        let window = self
            .hours
            .map(|hours| StatisticsWindow::trailing(Duration::hours(hours)));
        let stats = engine.dispatcher.statistics(window).await;
        print_json(&stats)
    }
}
