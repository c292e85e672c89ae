//! Configuration management for the OCR service.
//!
//! This module provides configuration types, validation traits, and the
//! loaders used at startup.

pub mod errors;
pub mod onnx;
pub mod service;

pub use errors::{ConfigError, ConfigValidator};
pub use onnx::{OrtGraphOptimizationLevel, OrtSessionConfig};
pub use service::{
    ColorOrder, DetectionConfig, NormalizationConfig, OCR_ADAPTER_ENV, PaddleOcrConfig,
    RecognitionConfig, ServiceConfig, VlmConfig,
};
