//! Startup orchestration.
//!
//! Order: resolve config → logging → metrics → bind. Any error before the
//! listener is bound is fatal.

use std::path::Path;

use crate::config::validation::validate_config;
use crate::config::{load_config, AppConfig, ConfigError};

/// Load the configuration file if given (defaults otherwise) and apply CLI overrides.
pub fn resolve_config(
    path: Option<&Path>,
    bind_override: Option<&str>,
) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    if let Some(bind) = bind_override {
        config.listener.bind_address = bind.to_string();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    Ok(config)
}
