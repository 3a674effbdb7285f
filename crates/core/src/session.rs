//! Per-request access tokens.
//!
//! A fresh [`Session`] is minted before every group request and passed
//! explicitly into the pipeline; nothing caches it across requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::error::PipelineError;
use crate::metrics;
use crate::platform::{AccessToken, PlatformApi};

/// An access token together with when it was obtained.
#[derive(Debug, Clone)]
pub struct Session {
    token: AccessToken,
    issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: AccessToken) -> Self {
        Self {
            token,
            issued_at: Utc::now(),
        }
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

pub struct SessionManager {
    platform: Arc<dyn PlatformApi>,
}

impl SessionManager {
    pub fn new(platform: Arc<dyn PlatformApi>) -> Self {
        Self { platform }
    }

    /// Obtain a fresh token from the platform.
    pub async fn refresh(&self) -> Result<Session, PipelineError> {
        info!("Updating token for account");

        match self.platform.fetch_access_token().await {
            Ok(token) => {
                info!("Updated token for account");
                metrics::TOKEN_REFRESHES.with_label_values(&["success"]).inc();
                Ok(Session::new(token))
            }
            Err(e) => {
                error!("Token refresh failed: {}", e);
                metrics::TOKEN_REFRESHES.with_label_values(&["failure"]).inc();
                Err(PipelineError::AuthFailure(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPlatform;

    #[tokio::test]
    async fn test_refresh_returns_new_session() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_token("tok-1").await;

        let before = Utc::now();
        let manager = SessionManager::new(platform.clone());
        let session = manager.refresh().await.unwrap();
        assert_eq!(session.token().as_str(), "tok-1");
        assert!(session.issued_at() >= before);
        assert_eq!(platform.token_fetches().await, 1);
    }

    #[tokio::test]
    async fn test_each_refresh_mints_a_new_session() {
        let platform = Arc::new(MockPlatform::new());
        let manager = SessionManager::new(platform.clone());

        let first = manager.refresh().await.unwrap();
        platform.set_token("tok-2").await;
        let second = manager.refresh().await.unwrap();

        assert_ne!(first.token(), second.token());
        assert!(second.issued_at() >= first.issued_at());
        assert_eq!(platform.token_fetches().await, 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_auth_failure() {
        let platform = Arc::new(MockPlatform::new());
        platform.fail_token_fetch().await;

        let manager = SessionManager::new(platform);
        let err = manager.refresh().await.unwrap_err();
        assert!(matches!(err, PipelineError::AuthFailure(_)));
    }
}
