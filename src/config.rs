// src/config.rs

//! Configuration loading utilities.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Load and validate configuration from a TOML file.
///
/// A missing file falls back to defaults; an invalid file is fatal.
pub fn load(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::load(path)?
    } else {
        log::warn!(
            "Config not found at {}. Using default configuration.",
            path.display()
        );
        Config::default()
    };

    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid configuration: {e}")))?;

    Ok(config)
}
