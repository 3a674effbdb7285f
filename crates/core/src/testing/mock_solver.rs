//! Mock challenge solver for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::solver::{ChallengeSolver, SolveError};

/// Mock implementation of the ChallengeSolver trait.
///
/// Returns scripted results in order, then `mock-solution` forever.
#[derive(Debug)]
pub struct MockSolver {
    solutions: Arc<RwLock<VecDeque<Result<String, SolveError>>>>,
    /// Image URLs passed to `solve`.
    requests: Arc<RwLock<Vec<String>>>,
}

impl Default for MockSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSolver {
    pub fn new() -> Self {
        Self {
            solutions: Arc::new(RwLock::new(VecDeque::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn push_solution(&self, result: Result<String, SolveError>) {
        self.solutions.write().await.push_back(result);
    }

    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    pub async fn solve_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl ChallengeSolver for MockSolver {
    async fn solve(&self, image_url: &str) -> Result<String, SolveError> {
        self.requests.write().await.push(image_url.to_string());
        self.solutions
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("mock-solution".to_string()))
    }
}
