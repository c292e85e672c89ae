//! The inference boundary.
//!
//! The detection-to-text pipeline treats a neural network as an opaque
//! function from an input tensor to an output tensor. [`InferenceEngine`] is
//! that function; [`OrtInfer`] is the ONNX Runtime implementation used in
//! production, and tests substitute their own engines.

pub mod ort_infer;

pub use ort_infer::OrtInfer;

use crate::core::errors::OCRError;
use crate::core::tensor::{Tensor4D, TensorD};

/// A model that maps an `[N, C, H, W]` input tensor to an output tensor.
pub trait InferenceEngine: Send + Sync + std::fmt::Debug {
    /// Name used in logs and error messages.
    fn model_name(&self) -> &str;

    /// Runs one forward pass.
    ///
    /// # Errors
    ///
    /// Returns [`OCRError::Inference`] when the runtime fails. Callers must
    /// not turn this into an empty result.
    fn infer(&self, input: &Tensor4D) -> Result<TensorD, OCRError>;
}
