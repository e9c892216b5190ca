use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Storage section exists (enforced by serde)
/// - Server port is not 0
/// - Output directory is not empty
/// - Scheduler pool has at least one worker
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.storage.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.output_dir cannot be empty".to_string(),
        ));
    }

    if config.scheduler.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.max_concurrent_jobs must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[storage]
output_dir = "/data/output"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let mut config = valid_config();
        config.scheduler.max_concurrent_jobs = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
