//! Logging setup
//!
//! Library code logs through the `log` facade; this wires the process-wide subscriber.

use rolling_logger::{LoggerError, LoggerOptions};

use crate::config::LoggingConfig;

/// Install the rolling logger described by `config`. Call once at process start.
pub fn init(config: &LoggingConfig) -> Result<(), LoggerError> {
    let options = LoggerOptions {
        level: config.level.clone(),
        ..LoggerOptions::default()
    };
    rolling_logger::init_logger_with(config.log_dir.as_deref(), &config.app_name, options)?;
    log::info!(
        "Logging initialized for {} at level {}",
        config.app_name,
        config.level
    );
    Ok(())
}

/// Recent log lines for diagnostics views
pub fn recent_lines() -> Vec<String> {
    rolling_logger::recent_lines()
}
