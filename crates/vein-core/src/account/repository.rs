//! Account repository trait.
//!
//! Defines the interface for account persistence operations.

use super::model::{Account, AccountStatus};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing account persistence.
///
/// This trait defines the contract for persisting and retrieving accounts,
/// decoupling the application's core logic from the specific storage
/// mechanism (e.g., TOML files, a relational database).
///
/// # Implementation Notes
///
/// `credit` and `adjust_power` must be atomic read-modify-write operations:
/// two concurrent calls for the same identity must both be applied in full.
/// Implementations backed by a store without atomic increments serialize
/// writes per repository instead.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Finds an account by its identity.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Account))`: Account found
    /// - `Ok(None)`: Account not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Account>>;

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the identity is empty
    /// - `InvalidInput` if an account with the same identity already exists
    /// - `StoreUnavailable` / `Io` if the store cannot be reached
    async fn create(&self, account: Account) -> Result<Account>;

    /// Atomically adds `amount` to the account's balance and updates
    /// `last_active_at`.
    ///
    /// # Returns
    ///
    /// The account as persisted after the increment.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no account exists for `identity`
    /// - `InvalidInput` if `amount` is negative
    async fn credit(&self, identity: &str, amount: f64) -> Result<Account>;

    /// Atomically adds `delta` to the account's mining power.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no account exists for `identity`
    /// - `InvalidInput` if the adjustment would make the power non-positive
    async fn adjust_power(&self, identity: &str, delta: f64) -> Result<Account>;

    /// Updates `last_active_at` to the current time.
    async fn touch(&self, identity: &str) -> Result<Account>;

    /// Sets the account's lifecycle status.
    async fn set_status(&self, identity: &str, status: AccountStatus) -> Result<Account>;

    /// Lists all stored accounts.
    async fn list_all(&self) -> Result<Vec<Account>>;
}
