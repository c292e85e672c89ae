//! Utility functions for the OCR pipeline.
//!
//! Image codecs, character table loading, perspective rectification and
//! result annotation.

pub mod dict;
pub mod image;
pub mod transform;
pub mod visualization;

pub use dict::read_character_dict;
pub use self::image::{decode_image, dynamic_to_rgb, encode_png, load_image};
pub use transform::rectify_crop;
pub use visualization::ImageAnnotator;
