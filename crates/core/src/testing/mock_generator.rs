//! Mock content generator for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::generator::{ContentGenerator, GeneratorError};

/// Mock implementation of the ContentGenerator trait.
///
/// Descriptions are derived from the topic; rendered images are a few
/// fixed bytes written to the requested path.
#[derive(Debug)]
pub struct MockGenerator {
    fail_describe: Arc<RwLock<bool>>,
    fail_render: Arc<RwLock<bool>>,
    /// Topics passed to `describe`.
    described: Arc<RwLock<Vec<String>>>,
    renders: Arc<RwLock<usize>>,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            fail_describe: Arc::new(RwLock::new(false)),
            fail_render: Arc::new(RwLock::new(false)),
            described: Arc::new(RwLock::new(Vec::new())),
            renders: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn fail_describe(&self) {
        *self.fail_describe.write().await = true;
    }

    pub async fn fail_render(&self) {
        *self.fail_render.write().await = true;
    }

    pub async fn described(&self) -> Vec<String> {
        self.described.read().await.clone()
    }

    /// Number of successful image renders.
    pub async fn renders(&self) -> usize {
        *self.renders.read().await
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn describe(&self, topic: &str) -> Result<String, GeneratorError> {
        self.described.write().await.push(topic.to_string());
        if *self.fail_describe.read().await {
            return Err(GeneratorError::Api {
                status: 500,
                message: "mock describe failure".to_string(),
            });
        }
        Ok(format!("All about {}", topic))
    }

    async fn render_image(&self, _topic: &str, dest: &Path) -> Result<(), GeneratorError> {
        if *self.fail_render.read().await {
            return Err(GeneratorError::Empty("mock render failure".to_string()));
        }
        tokio::fs::write(dest, b"\x89PNG mock").await?;
        *self.renders.write().await += 1;
        Ok(())
    }
}
