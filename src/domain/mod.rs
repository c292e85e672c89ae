//! Request and response records exchanged with OCR adapters.
//!
//! These types are what callers of an [`OcrPort`](crate::core::traits::OcrPort)
//! see; the processing stages never depend on them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::OCRError;
use crate::processors::OrientedBox;

/// Encoded image bytes submitted for recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrInput {
    pub bytes: Vec<u8>,
}

impl OcrInput {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Reads an image file without decoding it.
    pub fn from_path(path: &Path) -> Result<Self, OCRError> {
        Ok(Self::new(std::fs::read(path)?))
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

impl From<&OrientedBox> for Rect {
    fn from(bbox: &OrientedBox) -> Self {
        let (left, top, right, bottom) = bbox.bounds();
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// One recognized text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
    /// Region corners in original image coordinates, ordered
    /// top-left, top-right, bottom-right, bottom-left.
    #[serde(rename = "box")]
    pub bounding_box: OrientedBox,
}

impl OcrResult {
    pub fn new(text: impl Into<String>, confidence: f32, bounding_box: OrientedBox) -> Self {
        Self {
            text: text.into(),
            confidence,
            bounding_box,
        }
    }

    /// The axis-aligned rectangle enclosing the region.
    pub fn rect(&self) -> Rect {
        Rect::from(&self.bounding_box)
    }
}

/// Free-form description some adapters return alongside the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescription {
    pub description: String,
    pub sentence: String,
}

/// Everything an adapter returns for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Results in detection order.
    pub texts: Vec<OcrResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<ImageDescription>,
    /// PNG bytes of the input with the regions drawn on it.
    #[serde(skip)]
    pub annotated_image: Option<Vec<u8>>,
}

impl OcrOutput {
    pub fn new(texts: Vec<OcrResult>) -> Self {
        Self {
            texts,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::Point;

    #[test]
    fn test_rect_encloses_rotated_box() {
        let bbox = OrientedBox::from_points([
            Point::new(10.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 20.0),
            Point::new(0.0, 10.0),
        ]);
        let result = OcrResult::new("x", 0.5, bbox);
        let rect = result.rect();
        assert_eq!(
            rect,
            Rect {
                left: 0.0,
                top: 0.0,
                right: 20.0,
                bottom: 20.0
            }
        );
        assert_eq!(rect.width(), 20.0);
    }

    #[test]
    fn test_output_serialization() {
        let mut output = OcrOutput::new(vec![OcrResult::new(
            "hello",
            0.9,
            OrientedBox::from_ltrb(1.0, 2.0, 3.0, 4.0),
        )]);
        output.annotated_image = Some(vec![1, 2, 3]);

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["texts"][0]["text"], "hello");
        assert_eq!(json["texts"][0]["box"].as_array().unwrap().len(), 4);
        assert!(json.get("description").is_none());
        assert!(json.get("annotated_image").is_none());
    }

    #[test]
    fn test_input_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"\x89PNG").unwrap();
        let input = OcrInput::from_path(file.path()).unwrap();
        assert_eq!(input.bytes, b"\x89PNG");
    }
}
