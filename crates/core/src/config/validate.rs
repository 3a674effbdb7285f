use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Generator and solver API keys are set
/// - At least one create attempt is allowed
/// - Solver polling interval is non-zero and fits inside the solver timeout
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.generator.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "generator.api_key cannot be empty".to_string(),
        ));
    }

    if config.solver.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "solver.api_key cannot be empty".to_string(),
        ));
    }

    if config.platform.max_create_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "platform.max_create_attempts must be at least 1".to_string(),
        ));
    }

    if config.solver.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "solver.poll_interval_secs cannot be 0".to_string(),
        ));
    }

    if config.solver.timeout_secs < config.solver.poll_interval_secs {
        return Err(ConfigError::ValidationError(format!(
            "solver.timeout_secs ({}) is shorter than solver.poll_interval_secs ({})",
            config.solver.timeout_secs, config.solver.poll_interval_secs
        )));
    }

    Ok(())
}
