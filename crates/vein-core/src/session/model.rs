//! Mining session domain model.
//!
//! A session is the ephemeral record of one active accrual period. It lives
//! only in the registry; nothing about it is persisted, and losing it on
//! restart is acceptable because users simply start mining again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key identifying the channel a session was opened from.
///
/// For the Telegram surface this is the chat id rendered as a string; the
/// web dashboard passes its own client identifier. The registry guarantees
/// at most one session per subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// An in-progress accrual session for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningSession {
    /// Registry key this session is stored under.
    pub subject_id: SubjectId,
    /// Account identity this session accrues to.
    pub identity: String,
    /// When the session was opened. Used for duration reporting only.
    pub opened_at: DateTime<Utc>,
    /// The last point accrual was reconciled. Rewound forward on every
    /// successful reconciliation so the same interval is never counted
    /// twice; left untouched when persisting the credit fails.
    pub reconciled_at: DateTime<Utc>,
    /// Mining power captured at open/last reconciliation. Already-elapsed
    /// time always earns at this snapshot, not at the live account value.
    pub power_snapshot: f64,
    /// Units earned over the lifetime of this session, for reporting.
    pub session_earned: f64,
}

impl MiningSession {
    /// Opens a new session at `now` with the given power snapshot.
    pub fn open(
        subject_id: SubjectId,
        identity: impl Into<String>,
        power_snapshot: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            identity: identity.into(),
            opened_at: now,
            reconciled_at: now,
            power_snapshot,
            session_earned: 0.0,
        }
    }

    /// Minutes elapsed since the last reconciliation point, clamped to
    /// zero when the clock reads earlier than `reconciled_at`.
    pub fn unreconciled_minutes(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.reconciled_at).num_milliseconds();
        (millis as f64 / 60_000.0).max(0.0)
    }

    /// Total session duration in minutes as of `now`, clamped to zero.
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.opened_at).num_milliseconds();
        (millis as f64 / 60_000.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_open_session() {
        let now = Utc::now();
        let session = MiningSession::open(SubjectId::from("42"), "durov", 1.5, now);
        assert_eq!(session.opened_at, now);
        assert_eq!(session.reconciled_at, now);
        assert_eq!(session.power_snapshot, 1.5);
        assert_eq!(session.session_earned, 0.0);
    }

    #[test]
    fn test_unreconciled_minutes() {
        let now = Utc::now();
        let session = MiningSession::open(SubjectId::from("42"), "durov", 1.0, now);
        let later = now + Duration::minutes(10);
        assert!((session.unreconciled_minutes(later) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_clock_skew_clamps_to_zero() {
        let now = Utc::now();
        let session = MiningSession::open(SubjectId::from("42"), "durov", 1.0, now);
        let earlier = now - Duration::minutes(5);
        assert_eq!(session.unreconciled_minutes(earlier), 0.0);
        assert_eq!(session.duration_minutes(earlier), 0.0);
    }
}
