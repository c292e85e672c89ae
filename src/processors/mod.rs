//! Image processing stages of the OCR pipeline.
//!
//! # Modules
//!
//! * `db_postprocess` - Heatmap to oriented boxes (binarize, contours, unclip, box fit)
//! * `decode` - Greedy CTC decoding of recognizer scores
//! * `geometry` - Points, polygons and oriented boxes
//! * `normalization` - Image to tensor normalization
//! * `resize_detection` - Fixed-size resizing for the detector
//! * `resize_recognition` - Height normalization for recognizer crops
//! * `types` - Scale bookkeeping between original and resized images
//! * `unclip` - Polygon offsetting

pub mod db_postprocess;
mod decode;
mod geometry;
mod normalization;
pub mod resize_detection;
pub mod resize_recognition;
pub mod types;
pub mod unclip;

pub use db_postprocess::*;
pub use decode::*;
pub use geometry::*;
pub use normalization::*;
pub use resize_detection::*;
pub use resize_recognition::*;
pub use types::*;
pub use unclip::unclip;
