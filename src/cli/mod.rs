use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "onboard")]
#[command(about = "Contractor onboarding workflow engine")]
#[command(long_about = "Starts contractor onboarding sessions from user events, tracks document \
                       signatures and training, and grants tiered system access. State is kept in \
                       a snapshot file between invocations.")]
pub struct Cli {
    /// Configuration file to use instead of onboarding.toml / .onboarding-rc / environment
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dispatch a user-creation or role-change event read from a JSON file
    Dispatch {
        /// Path to the trigger event JSON
        file: PathBuf,
    },
    /// Start onboarding for a subject by hand, bypassing the role filter and approval gate
    Manual {
        /// Path to the subject profile JSON
        #[arg(long)]
        subject: PathBuf,
        /// Contractor role (Dispatcher or "Broker Agent")
        #[arg(long)]
        role: String,
        /// Administrator requesting the start
        #[arg(long)]
        actor: String,
    },
    /// Apply a signature provider webhook read from a JSON file
    Signature {
        /// Path to the webhook payload JSON
        file: PathBuf,
    },
    /// Apply a training-completion callback read from a JSON file
    Training {
        /// Path to the completion payload JSON
        file: PathBuf,
    },
    /// Re-run a session from its current step, typically after a retry backoff
    Advance { session_id: String },
    /// Cancel an active session
    Cancel {
        session_id: String,
        #[arg(long)]
        actor: String,
        #[arg(long, default_value = "cancelled by administrator")]
        reason: String,
    },
    /// Expire overdue signature requests and send due reminders
    Sweep,
    /// Show one session, the active session of a subject, or a summary of all sessions
    Status {
        session_id: Option<String>,
        #[arg(long, conflicts_with = "session_id")]
        subject: Option<String>,
    },
    /// Dispatch statistics over a trailing window
    Stats {
        /// Hours of history to include (all history when omitted)
        #[arg(long)]
        hours: Option<i64>,
    },
}

impl Commands {
    /// Read-only commands skip the snapshot write
    pub fn mutates_state(&self) -> bool {
        !matches!(self, Commands::Status { .. } | Commands::Stats { .. })
    }
}
