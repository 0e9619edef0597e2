//! In-memory registry of active mining sessions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use super::model::{MiningSession, SubjectId};

/// Tracks which subjects currently have an open accrual session.
///
/// `SessionRegistry` is the single source of truth for session liveness:
/// a session exists exactly while mining is considered active. Nothing here
/// is persisted; the registry starts empty on every process launch and is
/// rebuilt as users interact.
///
/// Each session is wrapped in its own `Mutex` so the periodic reconciler
/// and an explicit stop can never reconcile the same session concurrently,
/// while independent sessions stay unblocked.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SubjectId, Arc<Mutex<MiningSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Opens a session for `subject_id` if none exists.
    ///
    /// # Returns
    ///
    /// `true` if a new session was created, `false` if one was already
    /// active. The `false` case is a no-op signal, not an error.
    pub async fn start(
        &self,
        subject_id: SubjectId,
        identity: impl Into<String>,
        power_snapshot: f64,
        now: DateTime<Utc>,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&subject_id) {
            return false;
        }
        let session = MiningSession::open(subject_id.clone(), identity, power_snapshot, now);
        sessions.insert(subject_id, Arc::new(Mutex::new(session)));
        true
    }

    /// Looks up the session for `subject_id` without side effects.
    pub async fn get(&self, subject_id: &SubjectId) -> Option<Arc<Mutex<MiningSession>>> {
        let sessions = self.sessions.read().await;
        sessions.get(subject_id).cloned()
    }

    /// Removes and returns the session for `subject_id`, if any.
    pub async fn end(&self, subject_id: &SubjectId) -> Option<Arc<Mutex<MiningSession>>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(subject_id)
    }

    /// Snapshots all active sessions for the periodic sweep.
    ///
    /// The returned handles stay live even if a session is ended while the
    /// sweep runs; callers must re-check membership before acting on state
    /// that requires the session to still be registered.
    pub async fn active(&self) -> Vec<(SubjectId, Arc<Mutex<MiningSession>>)> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .map(|(id, session)| (id.clone(), session.clone()))
            .collect()
    }

    /// Whether a session is currently open for `subject_id`.
    pub async fn is_active(&self, subject_id: &SubjectId) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(subject_id)
    }

    /// Number of currently open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
