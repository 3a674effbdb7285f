//! Challenge (captcha) solving through an external polling service.

mod capguru;
mod protocol;

pub use capguru::CapGuruSolver;
pub use protocol::{parse_poll_response, parse_submit_response, PollStatus};

use std::time::Duration;

use async_trait::async_trait;

/// Errors from the challenge solving protocol.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("Failed to download challenge image: {0}")]
    Download(String),

    #[error("Transport error talking to solving service: {0}")]
    Transport(String),

    #[error("Solving service rejected the challenge: {0}")]
    Rejected(String),

    #[error("Unexpected solving service response: {0}")]
    UnexpectedResponse(String),

    #[error("No solution after {0:?}")]
    Timeout(Duration),

    #[error("Solving cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves a challenge image to the solution token the platform expects.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    async fn solve(&self, image_url: &str) -> Result<String, SolveError>;
}
