use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use super::{SessionStore, TriggerLogStore};
use crate::dispatch::TriggerLog;
use crate::workflow::{OrchestratorError, WorkflowSession};

pub const SNAPSHOT_VERSION: &str = "1";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    #[error("Snapshot rejected: {0}")]
    InvalidSnapshot(#[from] OrchestratorError),
}

/// Everything the engine holds, as written to disk between CLI invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: String,
    pub saved_at: DateTime<Utc>,
    pub hostname: String,
    pub sessions: Vec<WorkflowSession>,
    pub trigger_log: Vec<TriggerLog>,
}

impl StoreSnapshot {
    pub async fn capture(sessions: &SessionStore, log: &TriggerLogStore) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            saved_at: Utc::now(),
            hostname: hostname::get()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            sessions: sessions.sessions().await,
            trigger_log: log.entries().await,
        }
    }

    /// Write to a temporary file first, then rename over the target
    pub async fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let serialized = serde_json::to_string_pretty(self)?;
        let temp_file = path.with_extension("json.tmp");
        fs::write(&temp_file, serialized).await?;
        fs::rename(&temp_file, path).await?;

        info!(
            file = ?path,
            sessions = self.sessions.len(),
            trigger_log = self.trigger_log.len(),
            "Onboarding state saved"
        );
        Ok(())
    }

    /// Missing file means a fresh, empty state
    pub async fn load(path: &Path) -> Result<Option<Self>, PersistenceError> {
        if !fs::try_exists(path).await? {
            debug!(file = ?path, "No saved onboarding state");
            return Ok(None);
        }

        let content = fs::read_to_string(path).await?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: SNAPSHOT_VERSION.to_string(),
                found: snapshot.version,
            });
        }
        Ok(Some(snapshot))
    }

    pub async fn restore(self) -> Result<(SessionStore, TriggerLogStore), PersistenceError> {
        let sessions = SessionStore::from_sessions(self.sessions).await?;
        let log = TriggerLogStore::from_entries(self.trigger_log);
        Ok((sessions, log))
    }
}
