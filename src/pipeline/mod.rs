//! The OCR pipeline module.
//!
//! [`OcrPipeline`] chains the processing stages around a detector and a
//! recognizer; [`ProcessImageUseCase`] is the entry point callers use to run
//! any registered backend.

pub mod ocr;
pub mod process_image;

pub use ocr::OcrPipeline;
pub use process_image::ProcessImageUseCase;
