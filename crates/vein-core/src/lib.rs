pub mod account;
pub mod accrual;
pub mod boost;
pub mod config;
pub mod error;
pub mod session;

// Re-export common error type
pub use error::{Result, VeinError};

pub use account::{Account, AccountRepository, AccountStatus};
pub use accrual::{AccrualEngine, BASE_RATE_PER_MINUTE};
pub use boost::{BOOST_COOLDOWN, Challenge, ChallengeKind, POWER_INCREMENT};
pub use config::MiningConfig;
pub use session::{MiningSession, SessionRegistry, SubjectId};
