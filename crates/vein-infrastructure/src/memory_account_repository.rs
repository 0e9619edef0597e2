//! In-memory AccountRepository implementation.
//!
//! Used by tests and by ephemeral runs where nothing should touch disk.
//! Semantics match `TomlAccountRepository` exactly.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use vein_core::account::{Account, AccountRepository, AccountStatus};
use vein_core::error::{Result, VeinError};

#[derive(Default)]
pub struct MemoryAccountRepository {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds the repository, mainly for tests.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let map = accounts
            .into_iter()
            .map(|account| (account.identity.clone(), account))
            .collect();
        Self {
            accounts: RwLock::new(map),
        }
    }

    async fn update<F>(&self, identity: &str, mutate: F) -> Result<Account>
    where
        F: FnOnce(&mut Account) -> Result<()>,
    {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(identity)
            .ok_or_else(|| VeinError::not_found("account", identity))?;
        mutate(account)?;
        Ok(account.clone())
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.get(identity).cloned())
    }

    async fn create(&self, account: Account) -> Result<Account> {
        if account.identity.is_empty() {
            return Err(VeinError::invalid_input("identity must not be empty"));
        }
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.identity) {
            return Err(VeinError::invalid_input(format!(
                "account '{}' already exists",
                account.identity
            )));
        }
        accounts.insert(account.identity.clone(), account.clone());
        Ok(account)
    }

    async fn credit(&self, identity: &str, amount: f64) -> Result<Account> {
        if amount < 0.0 || !amount.is_finite() {
            return Err(VeinError::invalid_input(format!(
                "credit amount must be a non-negative number, got {amount}"
            )));
        }
        self.update(identity, |account| {
            account.total_mined += amount;
            account.last_active_at = Utc::now();
            Ok(())
        })
        .await
    }

    async fn adjust_power(&self, identity: &str, delta: f64) -> Result<Account> {
        self.update(identity, |account| {
            let next = account.mining_power + delta;
            if next <= 0.0 {
                return Err(VeinError::invalid_input(format!(
                    "mining power must stay positive (was {}, delta {delta})",
                    account.mining_power
                )));
            }
            account.mining_power = next;
            Ok(())
        })
        .await
    }

    async fn touch(&self, identity: &str) -> Result<Account> {
        self.update(identity, |account| {
            account.last_active_at = Utc::now();
            Ok(())
        })
        .await
    }

    async fn set_status(&self, identity: &str, status: AccountStatus) -> Result<Account> {
        self.update(identity, |account| {
            account.status = status;
            Ok(())
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> = self.accounts.read().await.values().cloned().collect();
        accounts.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(accounts)
    }
}
