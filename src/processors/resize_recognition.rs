//! Height normalization for recognizer crops.

use image::RgbImage;
use image::imageops::{self, FilterType};

/// Makes crops exactly `height` pixels tall, optionally capping the width.
#[derive(Debug, Clone, Copy)]
pub struct RecResize {
    pub height: u32,
    pub max_width: Option<u32>,
}

impl RecResize {
    pub fn new(height: u32, max_width: Option<u32>) -> Self {
        Self { height, max_width }
    }

    /// Resizes a crop, keeping its aspect ratio unless the width cap applies.
    ///
    /// Crops that already match are returned untouched.
    pub fn apply(&self, crop: RgbImage) -> RgbImage {
        let (w, h) = crop.dimensions();
        if w == 0 || h == 0 {
            return crop;
        }

        let mut target_w = if h == self.height {
            w
        } else {
            ((w as f32 * self.height as f32 / h as f32).round() as u32).max(1)
        };
        if let Some(max_w) = self.max_width {
            target_w = target_w.min(max_w.max(1));
        }

        if target_w == w && h == self.height {
            crop
        } else {
            imageops::resize(&crop, target_w, self.height, FilterType::Triangle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_crop_is_untouched() {
        let crop = RgbImage::from_pixel(120, 48, image::Rgb([1, 2, 3]));
        let out = RecResize::new(48, None).apply(crop.clone());
        assert_eq!(out, crop);
    }

    #[test]
    fn test_aspect_preserving_resize() {
        let out = RecResize::new(48, None).apply(RgbImage::new(100, 24));
        assert_eq!(out.dimensions(), (200, 48));
    }

    #[test]
    fn test_width_cap() {
        let out = RecResize::new(48, Some(320)).apply(RgbImage::new(1000, 48));
        assert_eq!(out.dimensions(), (320, 48));
    }
}
