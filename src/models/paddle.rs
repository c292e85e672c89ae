//! Local DB + CTC backend running two ONNX models.

use std::sync::Arc;

use tracing::info;

use crate::core::OCRError;
use crate::core::config::PaddleOcrConfig;
use crate::core::constants::{DEFAULT_INPUT_NAME, PADDLE_ADAPTER_NAME};
use crate::core::inference::OrtInfer;
use crate::core::traits::OcrPort;
use crate::domain::{OcrInput, OcrOutput};
use crate::pipeline::OcrPipeline;
use crate::utils::{decode_image, read_character_dict};

/// OCR backend built from a text detector, a text recognizer and their
/// character table.
#[derive(Debug)]
pub struct PaddleOcrAdapter {
    pipeline: OcrPipeline,
}

impl PaddleOcrAdapter {
    /// Loads both models and the character table.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::ModelLoad` for a missing or unloadable model or
    /// dictionary, and a configuration error for invalid settings.
    pub fn from_config(config: &PaddleOcrConfig) -> Result<Self, OCRError> {
        config.validate_parameters()?;

        let character = read_character_dict(&config.char_dict_path)?;
        let detector = OrtInfer::from_config(
            &config.session,
            &config.det_model_path,
            Some(config.det_input_name.as_deref().unwrap_or(DEFAULT_INPUT_NAME)),
        )?;
        let recognizer = OrtInfer::from_config(
            &config.session,
            &config.rec_model_path,
            Some(config.rec_input_name.as_deref().unwrap_or(DEFAULT_INPUT_NAME)),
        )?;

        info!(
            "Loaded detector {:?}, recognizer {:?} and {} characters",
            config.det_model_path,
            config.rec_model_path,
            character.len()
        );

        let pipeline = OcrPipeline::new(
            Arc::new(detector),
            Arc::new(recognizer),
            config,
            character,
        )?;
        Ok(Self::with_pipeline(pipeline))
    }

    /// Wraps an already assembled pipeline.
    pub fn with_pipeline(pipeline: OcrPipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &OcrPipeline {
        &self.pipeline
    }
}

impl OcrPort for PaddleOcrAdapter {
    fn name(&self) -> &str {
        PADDLE_ADAPTER_NAME
    }

    fn predict(&self, input: &OcrInput) -> Result<OcrOutput, OCRError> {
        let image = decode_image(&input.bytes)?;
        let texts = self.pipeline.run(&image)?;
        Ok(OcrOutput::new(texts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::InferenceEngine;
    use crate::core::tensor::{Tensor4D, TensorD};
    use crate::utils::encode_png;
    use image::{Rgb, RgbImage};
    use ndarray::{Array2, Array3};

    #[derive(Debug)]
    struct BlankDetector;

    impl InferenceEngine for BlankDetector {
        fn model_name(&self) -> &str {
            "blank_det"
        }

        fn infer(&self, input: &Tensor4D) -> Result<TensorD, OCRError> {
            let (_, _, h, w) = input.dim();
            Ok(Array2::<f32>::zeros((h, w)).into_dyn())
        }
    }

    #[derive(Debug)]
    struct UnusedRecognizer;

    impl InferenceEngine for UnusedRecognizer {
        fn model_name(&self) -> &str {
            "unused_rec"
        }

        fn infer(&self, _input: &Tensor4D) -> Result<TensorD, OCRError> {
            Ok(Array3::<f32>::zeros((1, 1, 2)).into_dyn())
        }
    }

    fn adapter() -> PaddleOcrAdapter {
        let mut config = PaddleOcrConfig::new("det.onnx", "rec.onnx", "dict.txt");
        config.detection.target_size = [32, 32];
        let pipeline = OcrPipeline::new(
            Arc::new(BlankDetector),
            Arc::new(UnusedRecognizer),
            &config,
            vec!["a".to_string()],
        )
        .unwrap();
        PaddleOcrAdapter::with_pipeline(pipeline)
    }

    #[test]
    fn test_blank_page_gives_empty_output() {
        let img = RgbImage::from_pixel(40, 30, Rgb([255, 255, 255]));
        let output = adapter()
            .predict(&OcrInput::new(encode_png(&img).unwrap()))
            .unwrap();
        assert!(output.is_empty());
        assert!(output.description.is_none());
    }

    #[test]
    fn test_undecodable_bytes() {
        let err = adapter().predict(&OcrInput::new(vec![0, 1, 2])).unwrap_err();
        assert!(matches!(err, OCRError::ImageLoad(_)));
    }

    #[test]
    fn test_missing_files_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let dict = dir.path().join("dict.txt");
        std::fs::write(&dict, "a\nb\n").unwrap();
        let config = PaddleOcrConfig::new(
            dir.path().join("missing_det.onnx"),
            dir.path().join("missing_rec.onnx"),
            &dict,
        );
        let err = PaddleOcrAdapter::from_config(&config).unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));

        let config = PaddleOcrConfig::new("det.onnx", "rec.onnx", dir.path().join("nope.txt"));
        assert!(matches!(
            PaddleOcrAdapter::from_config(&config),
            Err(OCRError::ModelLoad { .. })
        ));
    }
}
