use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Nesting is split on `__` because keys such as `api_key` and
/// `between_groups_secs` contain `_` themselves:
/// `GROUPFORGE_SOLVER__API_KEY` overrides `solver.api_key`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("GROUPFORGE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[pacing]
between_groups_secs = 10

[generator]
api_key = "sk"

[solver]
api_key = "guru"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.pacing.between_groups_secs, 10);
    }

    #[test]
    fn test_load_config_from_str_missing_generator() {
        let toml = r#"
[solver]
api_key = "guru"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/groupforge.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[input]
path = "fleet.json"

[generator]
api_key = "sk"

[solver]
api_key = "guru"
poll_interval_secs = 2
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.input.path.to_str().unwrap(), "fleet.json");
        assert_eq!(config.solver.poll_interval_secs, 2);
    }

    #[test]
    fn test_env_override_splits_on_double_underscore() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[pacing]
between_accounts_secs = 7

[generator]
api_key = "sk"

[solver]
api_key = "guru"
"#
        )
        .unwrap();

        std::env::set_var("GROUPFORGE_PACING__BETWEEN_ACCOUNTS_SECS", "11");
        let config = load_config(temp_file.path());
        std::env::remove_var("GROUPFORGE_PACING__BETWEEN_ACCOUNTS_SECS");

        assert_eq!(config.unwrap().pacing.between_accounts_secs, 11);
    }
}
