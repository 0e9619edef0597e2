use serde::{Deserialize, Serialize};

use crate::accrual::BASE_RATE_PER_MINUTE;

fn default_base_rate() -> f64 {
    BASE_RATE_PER_MINUTE
}

fn default_reconcile_interval_secs() -> u64 {
    60
}

fn default_challenge_ttl_secs() -> u64 {
    300
}

/// Mining policy knobs.
///
/// These are deployment-wide values; nothing here varies per account.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MiningConfig {
    /// Units earned per minute at mining power 1.0.
    #[serde(default = "default_base_rate")]
    pub base_rate_per_minute: f64,
    /// Cadence of the periodic reconciliation sweep.
    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,
    /// How long an issued boost challenge stays answerable.
    #[serde(default = "default_challenge_ttl_secs")]
    pub challenge_ttl_secs: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            base_rate_per_minute: default_base_rate(),
            reconcile_interval_secs: default_reconcile_interval_secs(),
            challenge_ttl_secs: default_challenge_ttl_secs(),
        }
    }
}
