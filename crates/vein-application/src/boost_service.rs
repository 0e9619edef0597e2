//! Mining power boost use case.

use std::sync::Arc;

use vein_core::account::{Account, AccountRepository};
use vein_core::boost::{BOOST_COOLDOWN, Challenge, POWER_INCREMENT};
use vein_core::error::Result;

/// Applies challenge-gated power boosts.
///
/// Verification is two steps: the surface checks the submitted answer
/// against the challenge it issued, then calls [`redeem`](Self::redeem).
/// A rejected solve changes nothing server-side and starts no cooldown;
/// the cooldown reported with each challenge is advisory, for the
/// client's local countdown only.
pub struct BoostService {
    repository: Arc<dyn AccountRepository>,
}

impl BoostService {
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self { repository }
    }

    /// Issues a fresh challenge.
    pub fn issue_challenge(&self) -> Challenge {
        Challenge::generate()
    }

    /// Checks `answer` against `challenge` and, if accepted, permanently
    /// raises the account's mining power by the fixed increment.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(account))`: solve accepted, increment applied
    /// - `Ok(None)`: solve rejected, no effect
    ///
    /// # Errors
    ///
    /// `NotFound` if the account does not exist; store errors otherwise.
    pub async fn redeem(
        &self,
        identity: &str,
        challenge: &Challenge,
        answer: &str,
    ) -> Result<Option<Account>> {
        if !challenge.verify(answer) {
            tracing::debug!(identity, challenge_id = %challenge.id, "boost solve rejected");
            return Ok(None);
        }

        let account = self.repository.adjust_power(identity, POWER_INCREMENT).await?;
        tracing::info!(
            identity,
            power = account.mining_power,
            "boost applied after accepted solve"
        );
        Ok(Some(account))
    }

    /// The advisory cooldown to report alongside issued challenges.
    pub fn cooldown_secs(&self) -> u64 {
        BOOST_COOLDOWN.num_seconds() as u64
    }
}
