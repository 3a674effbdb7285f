pub mod account;
pub mod config;
pub mod creator;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod orchestrator;
pub mod pacer;
pub mod platform;
pub mod results;
pub mod scratch;
pub mod session;
pub mod solver;
pub mod testing;

pub use account::{load_accounts, parse_accounts, Account, AccountError, GroupRequest};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, FleetMode,
    SanitizedConfig,
};
pub use creator::{CreatedGroup, CreatorConfig, GroupCreator};
pub use error::{PipelineError, RejectKind, UploadStage};
pub use generator::{ContentGenerator, GeneratorError, OpenAiGenerator};
pub use orchestrator::{AccountOrchestrator, AccountSummary, FleetOrchestrator, FleetReport};
pub use pacer::{Cancelled, Pacer};
pub use platform::{PlatformApi, PlatformConnector, PlatformError, VkConnector};
pub use results::{OutcomeRecord, PhotoStatus, ResultLog};
pub use session::{Session, SessionManager};
pub use solver::{CapGuruSolver, ChallengeSolver, SolveError};
