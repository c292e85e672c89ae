//! OCR backends.
//!
//! * `paddle` - Local DB detector + CTC recognizer running on ONNX Runtime
//! * `vlm` - Remote vision-language model behind a chat-completions API

pub mod paddle;
pub mod vlm;

use std::sync::Arc;

pub use paddle::PaddleOcrAdapter;
pub use vlm::VlmAdapter;

use crate::core::OCRError;
use crate::core::constants::{PADDLE_ADAPTER_NAME, VLM_ADAPTER_NAME};
use crate::core::registry::AdapterRegistry;
use crate::core::traits::OcrPort;

/// Registers every built-in backend under its default name.
///
/// # Errors
///
/// Fails if one of the names is already taken in `registry`.
pub fn register_default_adapters(registry: &mut AdapterRegistry) -> Result<(), OCRError> {
    registry.register(PADDLE_ADAPTER_NAME, |config| {
        let adapter = PaddleOcrAdapter::from_config(config.paddleocr()?)?;
        Ok(Arc::new(adapter) as Arc<dyn OcrPort>)
    })?;
    registry.register(VLM_ADAPTER_NAME, |config| {
        let adapter = VlmAdapter::from_config(config.vlm()?)?;
        Ok(Arc::new(adapter) as Arc<dyn OcrPort>)
    })
}
