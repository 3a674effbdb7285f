//! Failures of one group's pipeline.
//!
//! None of these abort an account's queue: the account orchestrator turns
//! them into a degraded outcome record plus a log entry.

use std::fmt;

use thiserror::Error;

use crate::solver::SolveError;

/// Non-retryable platform refusals of a create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    AuthorizationConflict,
    RateLimited,
    InvalidCredential,
}

impl fmt::Display for RejectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectKind::AuthorizationConflict => "token was issued to another address",
            RejectKind::RateLimited => "flood control, back off",
            RejectKind::InvalidCredential => "access token is invalid",
        };
        f.write_str(text)
    }
}

/// Stage of the photo upload sub-pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    RequestServer,
    Upload,
    Save,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::RequestServer => "request_server",
            UploadStage::Upload => "upload",
            UploadStage::Save => "save",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No usable access token: {0}")]
    AuthFailure(String),

    #[error("Could not solve challenge: {0}")]
    ChallengeUnsolved(#[from] SolveError),

    #[error("Platform rejected request: {0}")]
    PlatformRejected(RejectKind),

    #[error("Could not extract group id: {0}")]
    ExtractionFailure(String),

    #[error("Gave up after {attempts} create attempts")]
    AttemptsExhausted { attempts: u32 },

    #[error("Photo upload failed at {stage}: {reason}")]
    PhotoUploadFailure { stage: UploadStage, reason: String },

    #[error("Transport failure: {0}")]
    TransportFailure(String),
}
