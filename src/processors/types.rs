//! Types shared between processing stages.

use crate::processors::geometry::{OrientedBox, Point};

/// Original and resized dimensions of an image.
///
/// Boxes found on the resized image are mapped back with
/// `x' = x * orig_w / resized_w`, `y' = y * orig_h / resized_h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageScaleInfo {
    /// Width of the decoded input image.
    pub src_w: u32,
    /// Height of the decoded input image.
    pub src_h: u32,
    /// Width the image was resized to.
    pub resized_w: u32,
    /// Height the image was resized to.
    pub resized_h: u32,
}

impl ImageScaleInfo {
    pub fn new(src_w: u32, src_h: u32, resized_w: u32, resized_h: u32) -> Self {
        Self {
            src_w,
            src_h,
            resized_w,
            resized_h,
        }
    }

    /// Horizontal factor from resized to original coordinates.
    pub fn scale_x(&self) -> f32 {
        self.src_w as f32 / self.resized_w.max(1) as f32
    }

    /// Vertical factor from resized to original coordinates.
    pub fn scale_y(&self) -> f32 {
        self.src_h as f32 / self.resized_h.max(1) as f32
    }

    /// Maps a point from resized to original coordinates.
    pub fn to_original_point(&self, point: Point) -> Point {
        Point::new(point.x * self.scale_x(), point.y * self.scale_y())
    }

    /// Maps a box from resized to original coordinates.
    pub fn to_original(&self, bbox: &OrientedBox) -> OrientedBox {
        bbox.scale(self.scale_x(), self.scale_y())
    }

    /// Maps a box from original back to resized coordinates.
    pub fn to_resized(&self, bbox: &OrientedBox) -> OrientedBox {
        bbox.scale(1.0 / self.scale_x(), 1.0 / self.scale_y())
    }
}
