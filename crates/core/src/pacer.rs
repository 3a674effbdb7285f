//! Cancellable pacing delays.
//!
//! Every deliberate wait in the pipeline (between groups, between account
//! starts, between challenge polls) goes through a [`Pacer`], so a single
//! cancellation token can interrupt all of them.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Returned when a pause is interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// Suspends the current task for a named duration.
#[derive(Debug, Clone, Default)]
pub struct Pacer {
    cancel: CancellationToken,
}

impl Pacer {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Sleep for `duration` unless cancelled first.
    pub async fn pause(&self, duration: Duration, reason: &str) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        if duration.is_zero() {
            return Ok(());
        }

        debug!("Sleeping: {:?} | {}", duration, reason);
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_pause_waits_full_duration() {
        let pacer = Pacer::default();
        let start = Instant::now();
        pacer
            .pause(Duration::from_millis(50), "between groups")
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_pause_zero_returns_immediately() {
        let pacer = Pacer::default();
        assert!(pacer.pause(Duration::ZERO, "nothing").await.is_ok());
    }

    #[tokio::test]
    async fn test_pause_interrupted_by_cancel() {
        let token = CancellationToken::new();
        let pacer = Pacer::new(token.clone());

        let handle = tokio::spawn({
            let pacer = pacer.clone();
            async move { pacer.pause(Duration::from_secs(3600), "long").await }
        });
        token.cancel();

        assert_eq!(handle.await.unwrap(), Err(Cancelled));
        assert!(pacer.is_cancelled());
    }

    #[tokio::test]
    async fn test_clones_share_the_token() {
        let pacer = Pacer::default();
        let clone = pacer.clone();

        clone.token().cancel();

        assert!(pacer.token().is_cancelled());
        assert_eq!(
            pacer.pause(Duration::from_secs(3600), "after cancel").await,
            Err(Cancelled)
        );
    }

    #[tokio::test]
    async fn test_pause_after_cancel_fails_fast() {
        let token = CancellationToken::new();
        token.cancel();
        let pacer = Pacer::new(token);
        assert_eq!(pacer.pause(Duration::ZERO, "x").await, Err(Cancelled));
    }
}
