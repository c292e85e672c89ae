//! Drawing recognized regions onto the input image.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::core::OCRError;
use crate::domain::OcrResult;
use crate::utils::image::encode_png;

const BBOX_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Draws the axis-aligned box of every result.
#[derive(Debug, Clone)]
pub struct ImageAnnotator {
    /// Outline colour.
    pub color: Rgb<u8>,
    /// Outline thickness in pixels, growing outward.
    pub thickness: u32,
}

impl Default for ImageAnnotator {
    fn default() -> Self {
        Self {
            color: BBOX_COLOR,
            thickness: 2,
        }
    }
}

impl ImageAnnotator {
    pub fn new(color: Rgb<u8>, thickness: u32) -> Self {
        Self { color, thickness }
    }

    /// Draws the results in place. Lines falling outside the image are clipped.
    pub fn draw(&self, img: &mut RgbImage, results: &[OcrResult]) {
        for result in results {
            let Some(rect) = to_draw_rect(result) else {
                continue;
            };
            for t in 0..self.thickness.max(1) as i32 {
                let thick = Rect::at(rect.left() - t, rect.top() - t)
                    .of_size(rect.width() + 2 * t as u32, rect.height() + 2 * t as u32);
                draw_hollow_rect_mut(img, thick, self.color);
            }
        }
        debug!("Annotated {} regions", results.len());
    }

    /// Draws the results on a copy of `img` and returns it encoded as PNG.
    pub fn annotate(&self, img: &RgbImage, results: &[OcrResult]) -> Result<Vec<u8>, OCRError> {
        let mut canvas = img.clone();
        self.draw(&mut canvas, results);
        encode_png(&canvas)
    }
}

fn to_draw_rect(result: &OcrResult) -> Option<Rect> {
    let r = result.rect();
    let left = r.left.round() as i32;
    let top = r.top.round() as i32;
    let width = (r.right.round() as i32 - left + 1).max(0) as u32;
    let height = (r.bottom.round() as i32 - top + 1).max(0) as u32;
    (width > 0 && height > 0).then(|| Rect::at(left, top).of_size(width, height))
}
