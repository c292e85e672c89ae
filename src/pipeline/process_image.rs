//! The "process an image" use case.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::core::OCRError;
use crate::core::traits::OcrPort;
use crate::domain::{OcrInput, OcrOutput};
use crate::utils::{ImageAnnotator, decode_image};

/// Runs OCR through whichever backend it was built with.
#[derive(Debug, Clone)]
pub struct ProcessImageUseCase {
    port: Arc<dyn OcrPort>,
    annotator: Option<ImageAnnotator>,
}

impl ProcessImageUseCase {
    pub fn new(port: Arc<dyn OcrPort>) -> Self {
        Self {
            port,
            annotator: None,
        }
    }

    /// Also return the input image with every region outlined.
    pub fn with_annotator(mut self, annotator: ImageAnnotator) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn adapter_name(&self) -> &str {
        self.port.name()
    }

    /// Runs OCR on one image and logs how long the backend took.
    pub fn execute(&self, input: &OcrInput) -> Result<OcrOutput, OCRError> {
        let start = Instant::now();
        let mut output = self.port.predict(input)?;
        info!(
            "Inference with '{}' took {:.2} ms ({} regions)",
            self.port.name(),
            start.elapsed().as_secs_f64() * 1000.0,
            output.texts.len()
        );

        if let Some(annotator) = &self.annotator
            && output.annotated_image.is_none()
        {
            let image = decode_image(&input.bytes)?;
            output.annotated_image = Some(annotator.annotate(&image, &output.texts)?);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OcrResult;
    use crate::processors::OrientedBox;
    use crate::utils::encode_png;
    use image::{Rgb, RgbImage};

    #[derive(Debug)]
    struct FixedPort;

    impl OcrPort for FixedPort {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _input: &OcrInput) -> Result<OcrOutput, OCRError> {
            Ok(OcrOutput::new(vec![OcrResult::new(
                "hi",
                0.8,
                OrientedBox::from_ltrb(2.0, 2.0, 9.0, 6.0),
            )]))
        }
    }

    fn png_input() -> OcrInput {
        let img = RgbImage::from_pixel(12, 10, Rgb([255, 255, 255]));
        OcrInput::new(encode_png(&img).unwrap())
    }

    #[test]
    fn test_delegates_to_port() {
        let use_case = ProcessImageUseCase::new(Arc::new(FixedPort));
        let output = use_case.execute(&png_input()).unwrap();
        assert_eq!(use_case.adapter_name(), "fixed");
        assert_eq!(output.texts.len(), 1);
        assert!(output.annotated_image.is_none());
    }

    #[test]
    fn test_annotates_when_requested() {
        let use_case =
            ProcessImageUseCase::new(Arc::new(FixedPort)).with_annotator(ImageAnnotator::default());
        let output = use_case.execute(&png_input()).unwrap();
        let annotated = decode_image(output.annotated_image.as_deref().unwrap()).unwrap();
        assert_eq!(annotated.dimensions(), (12, 10));
        assert_eq!(annotated.get_pixel(2, 2), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_undecodable_input_fails_annotation() {
        let use_case =
            ProcessImageUseCase::new(Arc::new(FixedPort)).with_annotator(ImageAnnotator::default());
        assert!(use_case.execute(&OcrInput::new(b"nope".to_vec())).is_err());
    }
}
