//! Testing utilities and mock implementations of the external collaborators.
//!
//! Every trait the group pipeline talks through has a mock here, so the
//! whole fleet can be exercised without the platform, the generation API
//! or the solving service.
//!
//! # Example
//!
//! ```rust,ignore
//! use groupforge_core::testing::{fixtures, MockPlatform};
//!
//! let platform = MockPlatform::new();
//! platform.push_create_response(Err(fixtures::challenge_error("s1"))).await;
//! platform.push_create_response(Ok(fixtures::created_payload(42, "cats42"))).await;
//! ```

mod mock_generator;
mod mock_platform;
mod mock_solver;

pub use mock_generator::MockGenerator;
pub use mock_platform::{MockConnector, MockPlatform};
pub use mock_solver::MockSolver;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::json;
    use std::path::Path;

    use crate::account::{Account, GroupRequest};
    use crate::config::{Config, GeneratorConfig, OutputConfig, PacingConfig, SolverConfig};
    use crate::platform::{ApiError, CreatedGroupPayload, PlatformError};

    pub fn request(name: &str, topic: &str) -> GroupRequest {
        GroupRequest::new(name, topic)
    }

    /// An account with one request per `(name, topic)` pair.
    pub fn account(name: &str, groups: &[(&str, &str)]) -> Account {
        Account {
            name: name.to_string(),
            cookie: format!("remixsid={}", name.to_lowercase()),
            proxy: None,
            user_agent: None,
            groups: groups
                .iter()
                .map(|(group, topic)| GroupRequest::new(*group, *topic))
                .collect(),
        }
    }

    pub fn created_payload(id: u64, screen_name: &str) -> CreatedGroupPayload {
        CreatedGroupPayload {
            id: Some(id),
            screen_name: Some(screen_name.to_string()),
        }
    }

    /// A "Captcha needed" error carrying challenge `sid`.
    pub fn challenge_error(sid: &str) -> PlatformError {
        PlatformError::Api(ApiError::from_payload(json!({
            "error_code": 14,
            "error_msg": "Captcha needed",
            "captcha_sid": sid,
            "captcha_img": format!("https://api.vk.com/captcha.php?sid={}", sid),
        })))
    }

    pub fn api_error(code: i64, message: &str) -> PlatformError {
        PlatformError::Api(ApiError::from_payload(json!({
            "error_code": code,
            "error_msg": message,
        })))
    }

    /// A config with zero pacing whose output directories live under `root`.
    pub fn test_config(root: &Path) -> Config {
        Config {
            input: Default::default(),
            output: OutputConfig {
                results_dir: root.join("results"),
                logs_dir: root.join("logs"),
                temp_dir: root.join("tmp"),
                metrics_path: None,
            },
            pacing: PacingConfig {
                between_groups_secs: 0,
                between_accounts_secs: 0,
            },
            fleet: Default::default(),
            platform: Default::default(),
            generator: GeneratorConfig {
                api_key: "sk-test".to_string(),
                api_base: "http://localhost:1".to_string(),
                text_model: "gpt-4o".to_string(),
                image_model: "dall-e-3".to_string(),
                image_size: "1024x1024".to_string(),
                timeout_secs: 5,
                description_examples: vec![],
            },
            solver: SolverConfig {
                api_key: "guru-test".to_string(),
                base_url: "http://localhost:1".to_string(),
                poll_interval_secs: 1,
                timeout_secs: 5,
            },
        }
    }
}
