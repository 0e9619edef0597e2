//! Account domain model.
//!
//! Represents the durable per-user record that mining sessions accrue to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle status of an account.
///
/// Inactive accounts stay in the store and keep their balance; the admin
/// dashboard can toggle them back to active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl Default for AccountStatus {
    fn default() -> Self {
        AccountStatus::Active
    }
}

/// Represents the account concept in the application's core logic.
/// This is the "pure" model that the business logic layer operates on.
/// It is independent of any specific storage format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique external handle (Telegram username for bot users).
    pub identity: String,
    /// Accrual-rate multiplier. Invariant: strictly positive.
    pub mining_power: f64,
    /// Cumulative earned units. Invariant: non-negative, never decreased
    /// by this subsystem.
    pub total_mined: f64,
    pub registered_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub status: AccountStatus,
}

impl Account {
    /// Creates a fresh account with the default mining power and an empty
    /// balance, registered at `now`.
    pub fn new(identity: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            mining_power: 1.0,
            total_mined: 0.0,
            registered_at: now,
            last_active_at: now,
            status: AccountStatus::Active,
        }
    }

    /// Whether the account may open mining sessions.
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_defaults() {
        let now = Utc::now();
        let account = Account::new("durov", now);
        assert_eq!(account.identity, "durov");
        assert_eq!(account.mining_power, 1.0);
        assert_eq!(account.total_mined, 0.0);
        assert_eq!(account.status, AccountStatus::Active);
        assert!(account.is_active());
    }

    #[test]
    fn test_status_round_trip() {
        use std::str::FromStr;
        assert_eq!(AccountStatus::Active.to_string(), "active");
        assert_eq!(
            AccountStatus::from_str("inactive").unwrap(),
            AccountStatus::Inactive
        );
    }
}
