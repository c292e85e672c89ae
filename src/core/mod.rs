//! The core module of the OCR service.
//!
//! This module contains the pieces every backend builds on:
//! - Configuration management
//! - Constants used throughout the service
//! - Error handling
//! - The inference boundary and its ONNX Runtime implementation
//! - The OCR port and the adapter registry
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod registry;
pub mod tensor;
pub mod traits;

pub use config::{ConfigError, ConfigValidator, ServiceConfig};
pub use constants::*;
pub use errors::{OCRError, ProcessingStage};
pub use inference::{InferenceEngine, OrtInfer};
pub use registry::{AdapterFactory, AdapterRegistry};
pub use tensor::{Tensor2D, Tensor3D, Tensor4D, TensorD};
pub use traits::OcrPort;

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
