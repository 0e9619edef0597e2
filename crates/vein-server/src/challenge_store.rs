//! In-memory store of issued boost challenges for the HTTP surface.
//!
//! Challenges are one-shot: answering consumes them, right or wrong, so a
//! wrong answer means fetching a fresh challenge. Expired entries are
//! pruned whenever a new challenge is issued.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use vein_core::boost::Challenge;

pub struct ChallengeStore {
    ttl: Duration,
    pending: Mutex<HashMap<Uuid, Challenge>>,
}

impl ChallengeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Issues and remembers a fresh challenge.
    pub async fn issue(&self) -> Challenge {
        let challenge = Challenge::generate();
        let mut pending = self.pending.lock().await;
        let now = Utc::now();
        pending.retain(|_, entry| !entry.is_expired(now, self.ttl));
        pending.insert(challenge.id, challenge.clone());
        challenge
    }

    /// Removes and returns the challenge, if it exists and has not
    /// expired.
    pub async fn take(&self, id: &Uuid) -> Option<Challenge> {
        let mut pending = self.pending.lock().await;
        let challenge = pending.remove(id)?;
        if challenge.is_expired(Utc::now(), self.ttl) {
            return None;
        }
        Some(challenge)
    }
}
