//! Fixed-geometry resizing for the text detector.

use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::core::OCRError;
use crate::processors::types::ImageScaleInfo;

/// Resizes every input to the detector's fixed input size.
///
/// The aspect ratio is not preserved; the returned [`ImageScaleInfo`]
/// carries the per-axis factors needed to map boxes back.
#[derive(Debug, Clone, Copy)]
pub struct DetResize {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
}

impl DetResize {
    pub fn new(target_size: [u32; 2]) -> Self {
        Self {
            width: target_size[0],
            height: target_size[1],
        }
    }

    /// Resizes an image with bilinear filtering.
    ///
    /// # Errors
    ///
    /// Returns an error for empty images or an empty target size.
    pub fn apply(&self, img: &RgbImage) -> Result<(RgbImage, ImageScaleInfo), OCRError> {
        let (src_w, src_h) = img.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(OCRError::invalid_input(format!(
                "cannot resize an empty image ({src_w}x{src_h})"
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(OCRError::config_error(format!(
                "detector input size must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        let scale_info = ImageScaleInfo::new(src_w, src_h, self.width, self.height);
        if src_w == self.width && src_h == self.height {
            return Ok((img.clone(), scale_info));
        }

        let resized = imageops::resize(img, self.width, self.height, FilterType::Triangle);
        Ok((resized, scale_info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_to_target() {
        let resize = DetResize::new([64, 32]);
        let img = RgbImage::new(200, 50);
        let (resized, info) = resize.apply(&img).unwrap();
        assert_eq!(resized.dimensions(), (64, 32));
        assert_eq!(info.src_w, 200);
        assert_eq!(info.src_h, 50);
        assert!((info.scale_x() - 200.0 / 64.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_size_is_a_copy() {
        let resize = DetResize::new([10, 10]);
        let img = RgbImage::from_pixel(10, 10, image::Rgb([7, 8, 9]));
        let (resized, info) = resize.apply(&img).unwrap();
        assert_eq!(resized, img);
        assert_eq!(info.scale_x(), 1.0);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let resize = DetResize::new([10, 10]);
        assert!(resize.apply(&RgbImage::new(0, 5)).is_err());
    }
}
