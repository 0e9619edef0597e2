//! Accrual engine.
//!
//! Converts elapsed session time into persisted balance, exactly once per
//! elapsed interval. The engine owns no state of its own; it reads a
//! session, credits the account store, and rewinds the session's
//! reconciliation point so the same interval is never counted twice.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::account::AccountRepository;
use crate::error::Result;
use crate::session::MiningSession;

/// Units earned per minute at mining power 1.0. Shared by all accounts;
/// only the per-account power scales the rate.
pub const BASE_RATE_PER_MINUTE: f64 = 0.005;

/// Computes earned amounts and merges them into the account store.
pub struct AccrualEngine {
    repository: Arc<dyn AccountRepository>,
    base_rate: f64,
}

impl AccrualEngine {
    /// Creates an engine with the standard base rate.
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self::with_base_rate(repository, BASE_RATE_PER_MINUTE)
    }

    /// Creates an engine with a custom base rate. The rate must be
    /// positive; it is a deployment-wide policy value, never per-account.
    pub fn with_base_rate(repository: Arc<dyn AccountRepository>, base_rate: f64) -> Self {
        Self {
            repository,
            base_rate,
        }
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// Reconciles a session against the current wall clock.
    ///
    /// See [`reconcile_at`](Self::reconcile_at).
    pub async fn reconcile(&self, session: &mut MiningSession) -> Result<f64> {
        self.reconcile_at(session, Utc::now()).await
    }

    /// Converts the interval since the session's last reconciliation point
    /// into balance, credits it atomically, and rewinds the session clock.
    ///
    /// The session is mutated only after the store accepts the credit: on
    /// failure `reconciled_at` keeps its old value, so the next attempt
    /// recomputes the same (now larger) interval and no earned time is
    /// lost across transient store outages.
    ///
    /// A zero or negative elapsed interval (clock skew) earns exactly 0.0
    /// and skips the store round trip.
    ///
    /// # Returns
    ///
    /// The amount credited by this call.
    pub async fn reconcile_at(
        &self,
        session: &mut MiningSession,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        let minutes = session.unreconciled_minutes(now);
        if minutes <= 0.0 {
            return Ok(0.0);
        }

        let earned = self.base_rate * minutes * session.power_snapshot;
        let account = self.repository.credit(&session.identity, earned).await?;

        session.reconciled_at = now;
        // Boosts applied mid-interval take effect from this point on; the
        // interval just credited earned at the old snapshot.
        session.power_snapshot = account.mining_power;
        session.session_earned += earned;

        tracing::debug!(
            identity = %session.identity,
            minutes,
            earned,
            total = account.total_mined,
            "reconciled session"
        );
        Ok(earned)
    }

    /// Estimates the not-yet-credited earnings of a session as of now.
    pub fn preview(&self, session: &MiningSession) -> f64 {
        self.preview_at(session, Utc::now())
    }

    /// Estimates the not-yet-credited earnings of a session as of `now`,
    /// computed exactly as `reconcile_at` would, without mutating anything.
    pub fn preview_at(&self, session: &MiningSession, now: DateTime<Utc>) -> f64 {
        self.base_rate * session.unreconciled_minutes(now) * session.power_snapshot
    }
}
