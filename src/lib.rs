//! # OCR service
//!
//! Extracts text from images through interchangeable backends. The local
//! backend pairs a DB text detector with a CTC text recognizer, both run
//! with ONNX Runtime; a second backend forwards the image to a hosted
//! vision-language model.
//!
//! ## Local pipeline
//!
//! 1. Resize and normalize the image for the detector
//! 2. Binarize the detector heatmap
//! 3. Trace connected regions and simplify their outlines
//! 4. Grow each outline with an unclip offset
//! 5. Fit an oriented box and order its corners
//! 6. Warp each box into an upright crop of fixed height
//! 7. Normalize the crop and run the recognizer
//! 8. Greedy CTC decoding into text and confidence
//! 9. Map the box back to original image coordinates
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors, inference, the OCR port and the adapter registry
//! * [`domain`] - Request and response records
//! * [`models`] - The built-in backends
//! * [`pipeline`] - Stage orchestration and the process-image use case
//! * [`processors`] - The individual processing stages
//! * [`utils`] - Image codecs, dictionaries, rectification and annotation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr_service::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::from_file("service.yaml")?.with_env_overrides();
//! let registry = AdapterRegistry::with_builtin_adapters()?;
//! let use_case = ProcessImageUseCase::new(registry.resolve_configured(&config)?);
//!
//! let output = use_case.execute(&OcrInput::from_path(Path::new("document.jpg"))?)?;
//! for result in &output.texts {
//!     println!("{} ({:.2})", result.text, result.confidence);
//! }
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod core;
pub mod domain;
pub mod models;

pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use ocr_service::prelude::*;
/// ```
///
/// For stage-level work (custom engines, individual processors) import from
/// [`crate::core`] and [`crate::processors`] directly.
pub mod prelude {
    // Configuration and backend selection
    pub use crate::core::config::{PaddleOcrConfig, ServiceConfig, VlmConfig};
    pub use crate::core::{AdapterRegistry, OcrPort};

    // Running OCR
    pub use crate::domain::{OcrInput, OcrOutput, OcrResult, Rect};
    pub use crate::pipeline::{OcrPipeline, ProcessImageUseCase};
    pub use crate::utils::ImageAnnotator;

    // Error Handling (essential)
    pub use crate::core::OCRError;

    // Image Utility (minimal)
    pub use crate::utils::load_image;
}
