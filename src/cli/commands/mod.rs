use anyhow::{anyhow, Result};
use fd_lock::{RwLock, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collaborators::Collaborators;
use crate::config::OnboardingConfig;
use crate::dispatch::{DispatchPolicy, TriggerDispatcher};
use crate::store::{SessionStore, StoreSnapshot, TriggerLogStore};
use crate::workflow::{WorkflowOrchestrator, WorkflowSettings};

pub mod callbacks;
pub mod dispatch;
pub mod session;
pub mod status;
pub mod sweep;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, engine: &Engine) -> Result<()>;
}

/// Dispatcher and orchestrator wired over the snapshot file, held under an exclusive lock
pub struct Engine {
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub dispatcher: TriggerDispatcher,
    log: Arc<TriggerLogStore>,
    state_file: PathBuf,
    _lock_guard: RwLockWriteGuard<'static, File>,
}

impl Engine {
    pub async fn open(config: &OnboardingConfig) -> Result<Self> {
        Self::open_with(config, Collaborators::standard()).await
    }

    pub async fn open_with(config: &OnboardingConfig, collaborators: Collaborators) -> Result<Self> {
        let state_file = config.state_file();
        if let Some(parent) = state_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // One writer per snapshot
        let lock_file = File::create(state_file.with_extension("lock"))?;
        let lock = Box::leak(Box::new(RwLock::new(lock_file)));
        let guard = lock.try_write().map_err(|_| {
            anyhow!(
                "Another onboard command is using {}. Only one can run at a time.",
                state_file.display()
            )
        })?;

        let (sessions, log) = match StoreSnapshot::load(&state_file).await? {
            Some(snapshot) => snapshot.restore().await?,
            None => (SessionStore::new(), TriggerLogStore::new()),
        };
        let log = Arc::new(log);

        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            Arc::new(sessions),
            collaborators.clone(),
            WorkflowSettings::from_config(config),
        ));
        let dispatcher = TriggerDispatcher::new(
            DispatchPolicy::from_config(&config.dispatcher),
            orchestrator.clone(),
            log.clone(),
            &collaborators,
        );

        Ok(Self {
            orchestrator,
            dispatcher,
            log,
            state_file,
            _lock_guard: guard,
        })
    }

    pub async fn save(&self) -> Result<()> {
        StoreSnapshot::capture(self.orchestrator.store(), &self.log)
            .await
            .save(&self.state_file)
            .await?;
        Ok(())
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| anyhow!("Invalid JSON in {}: {}", path.display(), e))
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
