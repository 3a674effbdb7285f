//! Accounts and the group requests queued for them.

mod loader;
mod types;

pub use loader::{load_accounts, parse_accounts};
pub use types::{file_stem, Account, GroupRequest};

use thiserror::Error;

/// Errors raised while reading the account input file.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Account file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read account file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse account file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid account list: {0}")]
    Invalid(String),
}
