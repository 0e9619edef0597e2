//! TOML-file-backed AccountRepository implementation.
//!
//! Each account is stored as one TOML file under the data directory.
//! Writes go through a temp file plus rename, and every read-modify-write
//! operation holds the repository's write gate, which makes `credit` and
//! `adjust_power` atomic within the owning process. The deployment model
//! is a single server process owning the data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::sync::Mutex;

use vein_core::account::{Account, AccountRepository, AccountStatus};
use vein_core::error::{Result, VeinError};

/// TOML-file-per-account repository.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── accounts/
///     ├── durov.toml
///     └── alice.toml
/// ```
pub struct TomlAccountRepository {
    accounts_dir: PathBuf,
    /// Serializes read-modify-write cycles so concurrent increments for
    /// the same identity are both applied in full.
    write_gate: Mutex<()>,
}

impl TomlAccountRepository {
    /// Creates a repository rooted at `base_dir`, creating the accounts
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let accounts_dir = base_dir.as_ref().join("accounts");
        fs::create_dir_all(&accounts_dir).await?;
        Ok(Self {
            accounts_dir,
            write_gate: Mutex::new(()),
        })
    }

    /// Returns the directory account files are stored in.
    pub fn accounts_dir(&self) -> &Path {
        &self.accounts_dir
    }

    fn account_path(&self, identity: &str) -> PathBuf {
        self.accounts_dir.join(format!("{identity}.toml"))
    }

    /// Identities become filenames, so only filesystem-safe handles are
    /// accepted. Telegram usernames (letters, digits, underscore) all pass.
    fn validate_identity(identity: &str) -> Result<()> {
        if identity.is_empty() {
            return Err(VeinError::invalid_input("identity must not be empty"));
        }
        if identity.len() > 64 {
            return Err(VeinError::invalid_input("identity too long (max 64)"));
        }
        if !identity
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(VeinError::invalid_input(format!(
                "identity '{identity}' contains unsupported characters"
            )));
        }
        Ok(())
    }

    async fn load(&self, identity: &str) -> Result<Option<Account>> {
        let path = self.account_path(identity);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let account = toml::from_str(&content)?;
        Ok(Some(account))
    }

    async fn store(&self, account: &Account) -> Result<()> {
        let path = self.account_path(&account.identity);
        let tmp_path = path.with_extension("toml.tmp");
        let content = toml::to_string_pretty(account)?;
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    /// Loads, mutates and stores an account under the write gate.
    async fn update<F>(&self, identity: &str, mutate: F) -> Result<Account>
    where
        F: FnOnce(&mut Account) -> Result<()>,
    {
        let _gate = self.write_gate.lock().await;
        let mut account = self
            .load(identity)
            .await?
            .ok_or_else(|| VeinError::not_found("account", identity))?;
        mutate(&mut account)?;
        self.store(&account).await?;
        Ok(account)
    }
}

#[async_trait]
impl AccountRepository for TomlAccountRepository {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Account>> {
        if Self::validate_identity(identity).is_err() {
            return Ok(None);
        }
        self.load(identity).await
    }

    async fn create(&self, account: Account) -> Result<Account> {
        Self::validate_identity(&account.identity)?;
        let _gate = self.write_gate.lock().await;
        if self.load(&account.identity).await?.is_some() {
            return Err(VeinError::invalid_input(format!(
                "account '{}' already exists",
                account.identity
            )));
        }
        self.store(&account).await?;
        tracing::info!(identity = %account.identity, "created account");
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
        if !delta.is_finite() {
            return Err(VeinError::invalid_input("power delta must be finite"));
        }
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
        let mut accounts = Vec::new();
        let mut entries = fs::read_dir(&self.accounts_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            match toml::from_str::<Account>(&content) {
                Ok(account) => accounts.push(account),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unreadable account file");
                }
            }
        }
        accounts.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(accounts)
    }
}
