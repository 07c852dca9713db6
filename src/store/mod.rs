// Explicit session arena and trigger log shared by the dispatcher and orchestrator

pub mod snapshot;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::dispatch::TriggerLog;
use crate::types::{SessionId, SignatureId};
use crate::workflow::{OrchestratorError, WorkflowSession};

pub use snapshot::{PersistenceError, StoreSnapshot, SNAPSHOT_VERSION};

/// Exclusive handle to one session; holding the lock makes the holder its only mutator
pub type SessionHandle = Arc<Mutex<WorkflowSession>>;

#[derive(Default)]
struct Arena {
    sessions: HashMap<SessionId, SessionHandle>,
    by_signature: HashMap<SignatureId, SessionId>,
    /// Every session ever created for a subject, oldest first
    by_subject: HashMap<String, Vec<SessionId>>,
    active_subjects: HashMap<String, SessionId>,
}

/// Session arena with indexed lookups.
///
/// Lock order: a session lock may be held while taking the arena lock,
/// never the other way round.
#[derive(Default)]
pub struct SessionStore {
    arena: RwLock<Arena>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session; at most one active session per subject
    pub async fn insert(&self, session: WorkflowSession) -> Result<SessionHandle, OrchestratorError> {
        let mut arena = self.arena.write().await;
        let subject_id = session.subject_id().to_string();

        if let Some(existing) = arena.active_subjects.get(&subject_id) {
            return Err(OrchestratorError::DuplicateSession {
                subject_id,
                session_id: existing.clone(),
            });
        }

        let session_id = session.id.clone();
        for request in &session.signature_requests {
            arena
                .by_signature
                .insert(request.id.clone(), session_id.clone());
        }
        if !session.is_terminal() {
            arena
                .active_subjects
                .insert(subject_id.clone(), session_id.clone());
        }
        arena
            .by_subject
            .entry(subject_id)
            .or_default()
            .push(session_id.clone());

        let handle = Arc::new(Mutex::new(session));
        arena.sessions.insert(session_id, handle.clone());
        Ok(handle)
    }

    pub async fn get(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.arena.read().await.sessions.get(session_id).cloned()
    }

    pub async fn find_by_signature(&self, signature_id: &SignatureId) -> Option<SessionHandle> {
        let arena = self.arena.read().await;
        arena
            .by_signature
            .get(signature_id)
            .and_then(|id| arena.sessions.get(id))
            .cloned()
    }

    pub async fn find_active_by_subject(&self, subject_id: &str) -> Option<SessionHandle> {
        let arena = self.arena.read().await;
        arena
            .active_subjects
            .get(subject_id)
            .and_then(|id| arena.sessions.get(id))
            .cloned()
    }

    /// Most recent session for a subject, active or not
    pub async fn find_latest_by_subject(&self, subject_id: &str) -> Option<SessionHandle> {
        let arena = self.arena.read().await;
        arena
            .by_subject
            .get(subject_id)
            .and_then(|ids| ids.last())
            .and_then(|id| arena.sessions.get(id))
            .cloned()
    }

    pub async fn register_signatures(&self, session_id: &SessionId, signature_ids: &[SignatureId]) {
        let mut arena = self.arena.write().await;
        for signature_id in signature_ids {
            arena
                .by_signature
                .insert(signature_id.clone(), session_id.clone());
        }
    }

    /// Drop the subject's active marker once its session is terminal
    pub async fn release_subject(&self, subject_id: &str, session_id: &SessionId) {
        let mut arena = self.arena.write().await;
        if arena.active_subjects.get(subject_id) == Some(session_id) {
            arena.active_subjects.remove(subject_id);
        }
    }

    pub async fn handles(&self) -> Vec<SessionHandle> {
        let arena = self.arena.read().await;
        let mut ids: Vec<&SessionId> = arena.sessions.keys().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| arena.sessions.get(id).cloned())
            .collect()
    }

    /// Point-in-time copies of every session, ordered by id
    pub async fn sessions(&self) -> Vec<WorkflowSession> {
        let mut sessions = Vec::new();
        for handle in self.handles().await {
            sessions.push(handle.lock().await.clone());
        }
        sessions
    }

    pub async fn len(&self) -> usize {
        self.arena.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Rebuild a store, indices included, from saved sessions
    pub async fn from_sessions(sessions: Vec<WorkflowSession>) -> Result<Self, OrchestratorError> {
        let store = Self::new();
        let mut sessions = sessions;
        sessions.sort_by_key(|s| s.created_at);
        for session in sessions {
            store.insert(session).await?;
        }
        Ok(store)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("arena", &"RwLock<Arena>")
            .finish()
    }
}

/// Append-only dispatch audit trail
#[derive(Debug, Default)]
pub struct TriggerLogStore {
    entries: RwLock<Vec<TriggerLog>>,
}

impl TriggerLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<TriggerLog>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub async fn append(&self, entry: TriggerLog) {
        self.entries.write().await.push(entry);
    }

    pub async fn entries(&self) -> Vec<TriggerLog> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
