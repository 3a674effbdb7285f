//! Target platform RPC surface.
//!
//! [`PlatformApi`] is bound to one account (its cookie and egress route);
//! [`PlatformConnector`] builds one per account.

mod types;
mod vk;

pub use types::*;
pub use vk::{VkClient, VkConnector};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::account::Account;

/// Errors returned by platform calls.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The method answered with an `error` object.
    #[error("Platform error: {0}")]
    Api(ApiError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("No access token in response: {0}")]
    MissingToken(String),

    /// The photo upload endpoint answered with an error field.
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("Invalid proxy '{proxy}': {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            PlatformError::Decode(e.to_string())
        } else {
            PlatformError::Transport(e.to_string())
        }
    }
}

/// Remote procedures used by the group pipeline, scoped to one account.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Mint a fresh access token from the account's session cookie.
    async fn fetch_access_token(&self) -> Result<AccessToken, PlatformError>;

    async fn create_group(
        &self,
        token: &AccessToken,
        params: &CreateGroupParams,
    ) -> Result<CreatedGroupPayload, PlatformError>;

    /// Upload endpoint for an owner's profile photo (`owner_id < 0` for groups).
    async fn owner_photo_upload_server(
        &self,
        token: &AccessToken,
        owner_id: i64,
    ) -> Result<String, PlatformError>;

    async fn upload_photo(&self, upload_url: &str, photo: &Path)
        -> Result<UploadedPhoto, PlatformError>;

    async fn save_owner_photo(
        &self,
        token: &AccessToken,
        owner_id: i64,
        photo: &UploadedPhoto,
    ) -> Result<(), PlatformError>;
}

/// Builds account-scoped platform clients.
pub trait PlatformConnector: Send + Sync {
    fn connect(&self, account: &Account) -> Result<Arc<dyn PlatformApi>, PlatformError>;
}
