//! cap.guru solving service client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{parse_poll_response, parse_submit_response, ChallengeSolver, PollStatus, SolveError};
use crate::config::SolverConfig;
use crate::metrics;
use crate::pacer::Pacer;
use crate::scratch::ScratchFile;

/// Solver backed by the cap.guru `in.php`/`res.php` protocol.
pub struct CapGuruSolver {
    client: Client,
    api_key: String,
    base_url: String,
    temp_dir: PathBuf,
    poll_interval: Duration,
    timeout: Duration,
    pacer: Pacer,
}

impl CapGuruSolver {
    /// Create a solver that stores downloaded challenges under `temp_dir`.
    pub fn new(
        config: &SolverConfig,
        temp_dir: impl Into<PathBuf>,
        pacer: Pacer,
    ) -> Result<Self, SolveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SolveError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temp_dir: temp_dir.into(),
            poll_interval: config.poll_interval(),
            timeout: config.timeout(),
            pacer,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn download(&self, image_url: &str, dest: &Path) -> Result<(), SolveError> {
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| SolveError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SolveError::Download(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SolveError::Download(e.to_string()))?;
        if bytes.is_empty() {
            return Err(SolveError::Download("empty image body".to_string()));
        }

        tokio::fs::write(dest, &bytes).await?;
        debug!("Captcha saved as {}", dest.display());
        Ok(())
    }

    async fn submit(&self, encoded: &str) -> Result<String, SolveError> {
        let params = [
            ("key", self.api_key.as_str()),
            ("method", "base64"),
            ("body", encoded),
        ];

        let body = self
            .client
            .post(format!("{}/in.php", self.base_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| SolveError::Transport(e.to_string()))?
            .text()
            .await
            .map_err(|e| SolveError::Transport(e.to_string()))?;

        parse_submit_response(&body)
    }

    async fn poll_once(&self, request_id: &str) -> Result<PollStatus, SolveError> {
        let body = self
            .client
            .get(format!("{}/res.php", self.base_url))
            .query(&[
                ("key", self.api_key.as_str()),
                ("action", "get"),
                ("id", request_id),
            ])
            .send()
            .await
            .map_err(|e| SolveError::Transport(e.to_string()))?
            .text()
            .await
            .map_err(|e| SolveError::Transport(e.to_string()))?;

        parse_poll_response(&body)
    }

    async fn wait_for_solution(&self, request_id: &str) -> Result<String, SolveError> {
        loop {
            self.pacer
                .pause(self.poll_interval, "waiting for captcha solution")
                .await
                .map_err(|_| SolveError::Cancelled)?;

            match self.poll_once(request_id).await? {
                PollStatus::Pending => debug!("Captcha not ready yet, checking again"),
                PollStatus::Solved(solution) => return Ok(solution),
                PollStatus::Failed(reason) => return Err(SolveError::Rejected(reason)),
            }
        }
    }

    async fn solve_with_scratch(&self, image_url: &str) -> Result<String, SolveError> {
        let scratch = ScratchFile::claim(self.temp_dir.join(format!("{}.png", Uuid::new_v4())))?;

        self.download(image_url, scratch.path()).await?;
        let bytes = tokio::fs::read(scratch.path()).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let request_id = self.submit(&encoded).await?;
        info!("Captcha sent. Request ID: {}", request_id);

        match tokio::time::timeout(self.timeout, self.wait_for_solution(&request_id)).await {
            Ok(result) => result,
            Err(_) => Err(SolveError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl ChallengeSolver for CapGuruSolver {
    async fn solve(&self, image_url: &str) -> Result<String, SolveError> {
        let result = self.solve_with_scratch(image_url).await;

        match &result {
            Ok(solution) => {
                info!("Captcha solved: {}", solution);
                metrics::CHALLENGE_SOLVES.with_label_values(&["solved"]).inc();
            }
            Err(SolveError::Cancelled) => {
                warn!("Captcha solving cancelled");
                metrics::CHALLENGE_SOLVES.with_label_values(&["cancelled"]).inc();
            }
            Err(SolveError::Timeout(after)) => {
                error!("Captcha not solved within {:?}", after);
                metrics::CHALLENGE_SOLVES.with_label_values(&["timeout"]).inc();
            }
            Err(e) => {
                error!("Error solving captcha: {}", e);
                metrics::CHALLENGE_SOLVES.with_label_values(&["failed"]).inc();
            }
        }

        result
    }
}
