//! Account domain module.
//!
//! This module contains the durable account model and its repository
//! contract.
//!
//! # Module Structure
//!
//! - `model`: Account domain model and status enum
//! - `repository`: Account repository trait

mod model;
mod repository;

pub use model::{Account, AccountStatus};
pub use repository::AccountRepository;
