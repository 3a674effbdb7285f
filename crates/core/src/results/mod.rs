//! Append-only per-account outcome logs.

mod log;
mod record;

pub use log::{ResultLog, HEADER};
pub use record::{OutcomeRecord, PhotoStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Failed to write result log {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
