pub mod memory_account_repository;
pub mod paths;
pub mod retry;
pub mod settings;
pub mod toml_account_repository;

pub use crate::memory_account_repository::MemoryAccountRepository;
pub use crate::paths::VeinPaths;
pub use crate::retry::{RetryPolicy, retry_with_backoff};
pub use crate::settings::Settings;
pub use crate::toml_account_repository::TomlAccountRepository;
