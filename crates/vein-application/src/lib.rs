pub mod boost_service;
pub mod mining_service;
pub mod reconciler;

pub use boost_service::BoostService;
pub use mining_service::{MiningService, MiningStatus, StartOutcome, StopSummary};
pub use reconciler::{Reconciler, SweepStats};
