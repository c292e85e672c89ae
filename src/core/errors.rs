//! Error types for the OCR service.
//!
//! Every fallible operation in the crate returns [`OCRError`]. Degenerate
//! geometry (empty regions, zero-width crops) is not an error: those regions
//! are dropped by the pipeline and only show up in `debug` logs.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stage of the detection-to-text pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Annotated image rendering.
    Annotation,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Annotation => write!(f, "annotation"),
        }
    }
}

/// A plain message usable as an error source.
#[derive(Debug, Clone)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}

/// Errors produced by the OCR service.
#[derive(Error, Debug)]
pub enum OCRError {
    /// The input bytes could not be decoded as an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// A pipeline stage failed.
    #[error("{kind} failed: {context}")]
    Processing {
        kind: ProcessingStage,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The inference runtime failed or produced a tensor the pipeline cannot use.
    #[error("inference with model '{model_name}' failed: {context}")]
    Inference {
        model_name: String,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A model could not be loaded.
    #[error("failed to load model '{}': {context}", path.display())]
    ModelLoad {
        path: PathBuf,
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A remote recognition endpoint failed.
    #[error("remote endpoint '{endpoint}' failed: {context}")]
    Remote {
        endpoint: String,
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    /// Invalid or inconsistent configuration.
    #[error("configuration: {message}")]
    ConfigError {
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor shape operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    #[error("io")]
    Io(#[from] std::io::Error),
}

impl OCRError {
    /// Creates an error for a failed pipeline stage.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an error for an inference failure in `model_name`.
    pub fn inference_error(
        model_name: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an error for an output tensor whose shape the pipeline cannot use.
    pub fn unexpected_output(model_name: &str, expected: &str, actual: &[usize]) -> Self {
        Self::inference_error(
            model_name,
            &format!("expected output shaped {expected}, got {actual:?}"),
            SimpleError::new("unexpected output tensor shape"),
        )
    }

    /// Creates an error for a model that could not be loaded.
    pub fn model_load_error(
        path: &Path,
        context: &str,
        error: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::ModelLoad {
            path: path.to_path_buf(),
            context: context.to_string(),
            source: error.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Creates an error for a failed remote call.
    pub fn remote_error(
        endpoint: &str,
        context: &str,
        error: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::Remote {
            endpoint: endpoint.to_string(),
            context: context.to_string(),
            source: error.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an error for configuration problems.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for OCRError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for OCRError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_names_model() {
        let err = OCRError::unexpected_output("det", "[1, 1, H, W]", &[1, 3, 4, 4]);
        let msg = err.to_string();
        assert!(msg.contains("'det'"));
        assert!(msg.contains("[1, 3, 4, 4]"));
    }

    #[test]
    fn test_model_load_error_without_source() {
        let err = OCRError::model_load_error(
            Path::new("missing.onnx"),
            "model file not found",
            None::<SimpleError>,
        );
        assert!(matches!(err, OCRError::ModelLoad { .. }));
        assert!(err.to_string().contains("missing.onnx"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: OCRError = crate::core::config::ConfigError::invalid("bad").into();
        assert!(matches!(err, OCRError::ConfigError { .. }));
    }
}
