//! The port every OCR backend implements.

use std::fmt::Debug;

use crate::core::OCRError;
use crate::domain::{OcrInput, OcrOutput};

/// An OCR backend that turns encoded image bytes into recognized text.
///
/// Implementations are shared across threads behind an `Arc` and must not
/// keep per-request state.
pub trait OcrPort: Send + Sync + Debug {
    /// Name the backend is registered under.
    fn name(&self) -> &str;

    /// Runs OCR on one image.
    fn predict(&self, input: &OcrInput) -> Result<OcrOutput, OCRError>;
}
