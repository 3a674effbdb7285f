//! Account and fleet orchestration.
//!
//! - Account: strictly sequential over its group requests
//! - Fleet: one account task per account, starts paced

mod account;
mod fleet;
mod types;

pub use account::AccountOrchestrator;
pub use fleet::FleetOrchestrator;
pub use types::{AccountSummary, FleetReport};
