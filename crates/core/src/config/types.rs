use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    pub generator: GeneratorConfig,
    pub solver: SolverConfig,
}

/// Where the account list is read from
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("accounts.json")
}

/// Output locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory holding one CSV result log per account.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Directory holding one human-readable log per account.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
    /// Scratch directory for generated images and downloaded challenges.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Write a Prometheus text snapshot here when the run ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            logs_dir: default_logs_dir(),
            temp_dir: default_temp_dir(),
            metrics_path: None,
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("tmp")
}

/// Delays used to stay under platform rate limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PacingConfig {
    #[serde(default = "default_between_groups")]
    pub between_groups_secs: u64,
    #[serde(default = "default_between_accounts")]
    pub between_accounts_secs: u64,
}

impl PacingConfig {
    pub fn between_groups(&self) -> Duration {
        Duration::from_secs(self.between_groups_secs)
    }

    pub fn between_accounts(&self) -> Duration {
        Duration::from_secs(self.between_accounts_secs)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            between_groups_secs: default_between_groups(),
            between_accounts_secs: default_between_accounts(),
        }
    }
}

fn default_between_groups() -> u64 {
    60
}

fn default_between_accounts() -> u64 {
    30
}

/// How accounts are scheduled relative to each other
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub mode: FleetMode,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FleetMode {
    /// Accounts run concurrently; only their starts are paced.
    #[default]
    Staggered,
    /// Each account finishes before the next one starts.
    Sequential,
}

/// Target platform endpoints and request shaping
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Public site root, used for group URLs and request origin headers.
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Create-group calls per request before giving up (default: 3)
    #[serde(default = "default_max_create_attempts")]
    pub max_create_attempts: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Fallback User-Agent for accounts that get none from the pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Pool of User-Agents; each account without its own is assigned one.
    #[serde(default)]
    pub user_agents: Vec<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            login_url: default_login_url(),
            site_url: default_site_url(),
            api_version: default_api_version(),
            app_id: default_app_id(),
            max_create_attempts: default_max_create_attempts(),
            request_timeout_secs: default_request_timeout(),
            user_agent: None,
            user_agents: Vec::new(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.vk.com/method".to_string()
}

fn default_login_url() -> String {
    "https://login.vk.com/?act=web_token".to_string()
}

fn default_site_url() -> String {
    "https://vk.com".to_string()
}

fn default_api_version() -> String {
    "5.131".to_string()
}

fn default_app_id() -> String {
    "6287487".to_string()
}

fn default_max_create_attempts() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

/// Text and image generation service (OpenAI-compatible API)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    pub api_key: String,
    #[serde(default = "default_generator_api_base")]
    pub api_base: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_image_size")]
    pub image_size: String,
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
    /// Sample topic/description pairs embedded in the description prompt.
    #[serde(default)]
    pub description_examples: Vec<DescriptionExample>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DescriptionExample {
    pub topic: String,
    pub description: String,
}

fn default_generator_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_text_model() -> String {
    "gpt-4o".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_generator_timeout() -> u64 {
    120
}

/// Challenge solving service (cap.guru protocol)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolverConfig {
    pub api_key: String,
    #[serde(default = "default_solver_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Upper bound on waiting for one solution.
    #[serde(default = "default_solver_timeout")]
    pub timeout_secs: u64,
}

impl SolverConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_solver_url() -> String {
    "http://api.cap.guru".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_solver_timeout() -> u64 {
    180
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub pacing: PacingConfig,
    pub fleet: FleetConfig,
    pub platform: PlatformConfig,
    pub generator: SanitizedGeneratorConfig,
    pub solver: SanitizedSolverConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeneratorConfig {
    pub api_base: String,
    pub api_key_configured: bool,
    pub text_model: String,
    pub image_model: String,
    pub description_examples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSolverConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            input: config.input.clone(),
            output: config.output.clone(),
            pacing: config.pacing.clone(),
            fleet: config.fleet.clone(),
            platform: config.platform.clone(),
            generator: SanitizedGeneratorConfig {
                api_base: config.generator.api_base.clone(),
                api_key_configured: !config.generator.api_key.is_empty(),
                text_model: config.generator.text_model.clone(),
                image_model: config.generator.image_model.clone(),
                description_examples: config.generator.description_examples.len(),
            },
            solver: SanitizedSolverConfig {
                base_url: config.solver.base_url.clone(),
                api_key_configured: !config.solver.api_key.is_empty(),
                poll_interval_secs: config.solver.poll_interval_secs,
                timeout_secs: config.solver.timeout_secs,
            },
        }
    }
}
