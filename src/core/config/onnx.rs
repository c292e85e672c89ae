//! ONNX Runtime session configuration.

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigValidator};

/// Graph optimization levels for ONNX Runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrtGraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Enable basic optimizations.
    #[default]
    Level1,
    /// Enable extended optimizations.
    Level2,
    /// Enable all optimizations.
    Level3,
}

/// Configuration for ONNX Runtime sessions.
///
/// Every field is optional; unset fields keep the runtime defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrtSessionConfig {
    /// Number of threads used to parallelize execution within nodes
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes
    pub inter_threads: Option<usize>,
    /// Enable parallel execution mode
    pub parallel_execution: Option<bool>,
    /// Graph optimization level
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
    /// Number of sessions kept per model so concurrent requests do not queue on one lock
    pub session_pool_size: Option<usize>,
}

impl OrtSessionConfig {
    /// Creates a new OrtSessionConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of intra-op threads.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Sets the number of inter-op threads.
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    /// Sets the graph optimization level.
    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }

    /// Sets how many sessions are created per model.
    pub fn with_session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = Some(size);
        self
    }

    /// Effective session pool size (at least one).
    pub fn pool_size(&self) -> usize {
        self.session_pool_size.unwrap_or(1).max(1)
    }
}

impl ConfigValidator for OrtSessionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(intra) = self.intra_threads {
            self.require_thread_count("intra_threads", intra)?;
        }
        if let Some(inter) = self.inter_threads {
            self.require_thread_count("inter_threads", inter)?;
        }
        if self.session_pool_size == Some(0) {
            return Err(ConfigError::invalid(
                "session_pool_size must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let config = OrtSessionConfig::new()
            .with_intra_threads(4)
            .with_inter_threads(2)
            .with_optimization_level(OrtGraphOptimizationLevel::Level2)
            .with_session_pool_size(3);

        assert_eq!(config.intra_threads, Some(4));
        assert_eq!(config.inter_threads, Some(2));
        assert_eq!(
            config.optimization_level,
            Some(OrtGraphOptimizationLevel::Level2)
        );
        assert_eq!(config.pool_size(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = OrtSessionConfig::new().with_intra_threads(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pool_size_defaults_to_one() {
        assert_eq!(OrtSessionConfig::default().pool_size(), 1);
    }
}
