//! Image decoding and encoding helpers.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::core::{OCRError, ProcessingStage};

/// Converts a DynamicImage to an RgbImage, dropping alpha and expanding gray.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Decodes an encoded image (PNG, JPEG, ...) held in memory.
///
/// # Errors
///
/// Returns `OCRError::ImageLoad` when the bytes are not a decodable image.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, OCRError> {
    let img = image::load_from_memory(bytes).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns `OCRError::ImageLoad` if the file cannot be opened or decoded.
pub fn load_image(path: &Path) -> Result<RgbImage, OCRError> {
    let img = image::open(path).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Encodes an image as PNG.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, OCRError> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).map_err(|e| {
        OCRError::processing_error(ProcessingStage::Annotation, "failed to encode PNG", e)
    })?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_png_bytes_decode_back() {
        let img = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode_image(&bytes).unwrap(), img);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, OCRError::ImageLoad(_)));
    }

    #[test]
    fn test_load_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&path).unwrap();
        let img = load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (4, 4));
        assert!(load_image(&dir.path().join("missing.png")).is_err());
    }
}
