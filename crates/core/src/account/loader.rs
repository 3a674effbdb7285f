use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use super::{Account, AccountError};

/// Read the JSON account list from disk.
pub fn load_accounts(path: &Path) -> Result<Vec<Account>, AccountError> {
    if !path.exists() {
        return Err(AccountError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let accounts = parse_accounts(&content)?;
    info!("< {} > accounts loaded from {:?}", accounts.len(), path);
    Ok(accounts)
}

/// Parse and sanity-check a JSON account list.
///
/// Account names must be non-empty and unique once mapped to file stems,
/// since each account owns its own result and log files.
pub fn parse_accounts(json: &str) -> Result<Vec<Account>, AccountError> {
    let accounts: Vec<Account> = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    for (i, account) in accounts.iter().enumerate() {
        if account.name.trim().is_empty() {
            return Err(AccountError::Invalid(format!(
                "account #{} has an empty name",
                i + 1
            )));
        }
        if !seen.insert(account.file_stem()) {
            return Err(AccountError::Invalid(format!(
                "duplicate account name '{}'",
                account.name
            )));
        }
    }

    Ok(accounts)
}
