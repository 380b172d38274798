//! Logging configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// "error", "warn", "info", "debug" or "trace"
    /// Env: NJANGI_LOG_LEVEL
    pub level: String,

    /// "text" or "json"
    /// Env: NJANGI_LOG_FORMAT
    pub format: String,

    /// Write to stderr instead of stdout
    pub stderr: bool,

    pub file_enabled: bool,

    /// Env: NJANGI_LOG_FILE (also enables file output)
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            stderr: true,
            file_enabled: false,
            file_path: "./logs/njangi.log".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("NJANGI_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("NJANGI_LOG_FORMAT") {
            self.format = format;
        }
        if let Ok(path) = env::var("NJANGI_LOG_FILE") {
            self.file_path = path;
            self.file_enabled = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.level_filter().is_none() {
            bail!("logging.level must be one of error, warn, info, debug, trace (got {})", self.level);
        }
        if !matches!(self.format.to_ascii_lowercase().as_str(), "text" | "json") {
            bail!("logging.format must be text or json (got {})", self.format);
        }
        Ok(())
    }

    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => Some(log::LevelFilter::Off),
            "error" => Some(log::LevelFilter::Error),
            "warn" | "warning" => Some(log::LevelFilter::Warn),
            "info" => Some(log::LevelFilter::Info),
            "debug" => Some(log::LevelFilter::Debug),
            "trace" => Some(log::LevelFilter::Trace),
            _ => None,
        }
    }
}
