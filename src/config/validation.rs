//! Configuration validation
//!
//! Structural validation runs once at load time. A validation failure is the
//! only configuration problem that aborts a run; everything else degrades.

use crate::config::types::Config;
use crate::region::is_known_region;
use crate::ConfigError;

/// Validates a loaded configuration
///
/// # Errors
///
/// Returns `ConfigError::Validation` describing the first problem found.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.requests_per_second <= 0.0 {
        return Err(ConfigError::Validation(
            "requests-per-second must be greater than zero".to_string(),
        ));
    }

    if config.crawler.max_workers == 0 {
        return Err(ConfigError::Validation(
            "max-workers must be at least 1".to_string(),
        ));
    }

    if config.crawler.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be at least 1".to_string(),
        ));
    }

    if !is_known_region(&config.crawler.region) {
        return Err(ConfigError::Validation(format!(
            "unknown region code: {}",
            config.crawler.region
        )));
    }

    if config.output.data_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output data-dir must not be empty".to_string(),
        ));
    }

    for name in config.channels.keys() {
        if crate::channel::Channel::from_name(name).is_err() {
            return Err(ConfigError::Validation(format!(
                "channel override for unknown channel: {}",
                name
            )));
        }
    }

    Ok(())
}
