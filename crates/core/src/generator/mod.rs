//! Content generation for new groups: a text description and a profile image.

mod openai;
mod prompts;

pub use openai::OpenAiGenerator;
pub use prompts::{description_prompt, image_prompt};

use std::path::Path;

use async_trait::async_trait;

/// Error type for generation operations.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Empty response: {0}")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces descriptive content for a group topic.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a group description for `topic`.
    async fn describe(&self, topic: &str) -> Result<String, GeneratorError>;

    /// Generate a profile image for `topic` and write it to `dest`.
    async fn render_image(&self, topic: &str, dest: &Path) -> Result<(), GeneratorError>;
}
