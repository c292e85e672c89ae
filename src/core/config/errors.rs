//! Configuration errors and the shared validation helpers.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A model, dictionary or prompt file is missing.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The configuration file could not be read or parsed.
    #[error("failed to parse configuration '{}': {message}", path.display())]
    ParseFailed { path: PathBuf, message: String },

    #[error("resource limit exceeded: {message}")]
    ResourceLimitExceeded { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Validation shared by the configuration value objects.
///
/// A service validates each object once at startup so that bad settings
/// never reach a request.
pub trait ConfigValidator {
    fn validate(&self) -> Result<(), ConfigError>;

    /// Requires `path` to name an existing regular file.
    fn require_file(&self, path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(ConfigError::invalid(format!(
                "{} is not a file",
                path.display()
            )));
        }
        Ok(())
    }

    fn require_positive_size(&self, field: &str, width: u32, height: u32) -> Result<(), ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::invalid(format!(
                "{field} must be positive, got {width}x{height}"
            )));
        }
        Ok(())
    }

    /// Requires `value` to lie in `[0, 1]`.
    fn require_unit_interval(&self, field: &str, value: f32) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::invalid(format!(
                "{field} must be between 0.0 and 1.0, got {value}"
            )));
        }
        Ok(())
    }

    fn require_non_negative(&self, field: &str, value: f32) -> Result<(), ConfigError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::invalid(format!(
                "{field} must be a finite non-negative number, got {value}"
            )));
        }
        Ok(())
    }

    fn require_thread_count(&self, field: &str, threads: usize) -> Result<(), ConfigError> {
        const MAX_THREADS: usize = 256;

        match threads {
            0 => Err(ConfigError::invalid(format!("{field} must be greater than 0"))),
            n if n > MAX_THREADS => Err(ConfigError::ResourceLimitExceeded {
                message: format!("{field} of {n} exceeds the maximum of {MAX_THREADS}"),
            }),
            _ => Ok(()),
        }
    }
}
