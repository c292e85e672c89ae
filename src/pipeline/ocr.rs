//! Detection-to-text orchestration.
//!
//! [`OcrPipeline`] runs the detector once over the whole image, turns its
//! heatmap into oriented boxes, then rectifies, recognizes and decodes each
//! region. Boxes are found and cropped on the resized image and mapped back
//! to original coordinates only when the result is assembled.

use std::sync::Arc;

use image::RgbImage;
use ndarray::ArrayView2;
use rayon::prelude::*;
use tracing::debug;

use crate::core::OCRError;
use crate::core::config::PaddleOcrConfig;
use crate::core::inference::InferenceEngine;
use crate::core::tensor::TensorD;
use crate::domain::OcrResult;
use crate::processors::{
    CTCLabelDecode, DBPostProcess, DetResize, ImageScaleInfo, NormalizeImage, OrientedBox,
    RecResize,
};
use crate::utils::rectify_crop;

/// The full detection, recognition and decoding pipeline.
#[derive(Debug)]
pub struct OcrPipeline {
    detector: Arc<dyn InferenceEngine>,
    recognizer: Arc<dyn InferenceEngine>,
    det_resize: DetResize,
    det_norm: NormalizeImage,
    post: DBPostProcess,
    rec_resize: RecResize,
    rec_norm: NormalizeImage,
    decoder: CTCLabelDecode,
    rec_height: u32,
    parallel_regions: bool,
}

impl OcrPipeline {
    /// Assembles a pipeline around two inference engines.
    ///
    /// # Arguments
    ///
    /// * `detector` - Produces a single-channel text probability map.
    /// * `recognizer` - Produces a `T x C` score matrix per crop.
    /// * `config` - Detection, recognition and normalization settings.
    /// * `character` - Character table; class `i` maps to `character[i]`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any numeric setting is invalid.
    pub fn new(
        detector: Arc<dyn InferenceEngine>,
        recognizer: Arc<dyn InferenceEngine>,
        config: &PaddleOcrConfig,
        character: Vec<String>,
    ) -> Result<Self, OCRError> {
        config.validate_parameters()?;
        let rec = &config.recognition;

        Ok(Self {
            detector,
            recognizer,
            det_resize: DetResize::new(config.detection.target_size),
            det_norm: NormalizeImage::from_config(&config.det_norm)?,
            post: DBPostProcess::new(&config.detection),
            rec_resize: RecResize::new(rec.rec_height, rec.max_width),
            rec_norm: NormalizeImage::from_config(&config.rec_norm)?,
            decoder: CTCLabelDecode::new(character, !rec.output_is_probability),
            rec_height: rec.rec_height,
            parallel_regions: config.parallel_regions,
        })
    }

    /// Recognizes all text regions of an image.
    ///
    /// Results come back in detection scan order. An image without text
    /// yields an empty vector.
    ///
    /// # Errors
    ///
    /// Fails on empty images, inference failures, malformed model outputs
    /// and character tables too short for the recognizer.
    pub fn run(&self, image: &RgbImage) -> Result<Vec<OcrResult>, OCRError> {
        let (resized, scale) = self.det_resize.apply(image)?;
        let input = self.det_norm.apply(&resized);

        let raw = self.detector.infer(&input)?;
        let heatmap = self.heatmap_view(&raw, resized.width(), resized.height())?;
        let boxes = self.post.apply(&heatmap);
        debug!("Detected {} text regions", boxes.len());

        let recognized: Vec<Option<OcrResult>> = if self.parallel_regions {
            boxes
                .par_iter()
                .map(|bbox| self.recognize_region(&resized, bbox, &scale))
                .collect::<Result<_, _>>()?
        } else {
            boxes
                .iter()
                .map(|bbox| self.recognize_region(&resized, bbox, &scale))
                .collect::<Result<_, _>>()?
        };

        Ok(recognized.into_iter().flatten().collect())
    }

    /// Rectifies, recognizes and decodes one region.
    ///
    /// Returns `None` when the region's corners do not form a usable quad.
    fn recognize_region(
        &self,
        resized: &RgbImage,
        bbox: &OrientedBox,
        scale: &ImageScaleInfo,
    ) -> Result<Option<OcrResult>, OCRError> {
        let Some(crop) = rectify_crop(resized, bbox, self.rec_height)? else {
            debug!("Skipping degenerate region {:?}", bbox.points());
            return Ok(None);
        };
        let crop = self.rec_resize.apply(crop);
        let input = self.rec_norm.apply(&crop);

        let raw = self.recognizer.infer(&input)?;
        let scores = self.score_view(&raw)?;
        let decoded = self.decoder.decode(&scores)?;

        Ok(Some(OcrResult::new(
            decoded.text,
            decoded.confidence,
            scale.to_original(bbox),
        )))
    }

    /// Views detector output as a `H x W` heatmap of the detector input size.
    fn heatmap_view<'a>(
        &self,
        raw: &'a TensorD,
        width: u32,
        height: u32,
    ) -> Result<ArrayView2<'a, f32>, OCRError> {
        let (h, w) = (height as usize, width as usize);
        let matches = match *raw.shape() {
            [1, 1, rh, rw] | [1, rh, rw] | [rh, rw] => rh == h && rw == w,
            _ => false,
        };
        if !matches {
            return Err(OCRError::unexpected_output(
                self.detector.model_name(),
                &format!("[1, 1, {h}, {w}]"),
                raw.shape(),
            ));
        }
        Ok(raw.view().into_shape_with_order((h, w))?)
    }

    /// Views recognizer output as a `T x C` score matrix.
    fn score_view<'a>(&self, raw: &'a TensorD) -> Result<ArrayView2<'a, f32>, OCRError> {
        match *raw.shape() {
            [1, steps, classes] | [steps, classes] => {
                Ok(raw.view().into_shape_with_order((steps, classes))?)
            }
            ref other => Err(OCRError::unexpected_output(
                self.recognizer.model_name(),
                "[1, T, C]",
                other,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tensor::{Tensor3D, Tensor4D};
    use image::Rgb;
    use ndarray::Array4;

    /// Paints rectangles `(top, left, bottom, right)` into the heatmap.
    #[derive(Debug)]
    struct BlobDetector {
        blobs: Vec<(usize, usize, usize, usize)>,
        channels: usize,
    }

    impl InferenceEngine for BlobDetector {
        fn model_name(&self) -> &str {
            "blob_det"
        }

        fn infer(&self, input: &Tensor4D) -> Result<TensorD, OCRError> {
            let (_, _, h, w) = input.dim();
            let mut map = Array4::<f32>::zeros((1, self.channels, h, w));
            for &(top, left, bottom, right) in &self.blobs {
                for c in 0..self.channels {
                    for y in top..bottom {
                        for x in left..right {
                            map[[0, c, y, x]] = 0.95;
                        }
                    }
                }
            }
            Ok(map.into_dyn())
        }
    }

    /// Sets heatmap pixels where `paint(x, y)` holds.
    #[derive(Debug)]
    struct PaintDetector {
        paint: fn(usize, usize) -> bool,
    }

    impl InferenceEngine for PaintDetector {
        fn model_name(&self) -> &str {
            "paint_det"
        }

        fn infer(&self, input: &Tensor4D) -> Result<TensorD, OCRError> {
            let (_, _, h, w) = input.dim();
            let map = Array4::<f32>::from_shape_fn((1, 1, h, w), |(_, _, y, x)| {
                if (self.paint)(x, y) { 0.95 } else { 0.0 }
            });
            Ok(map.into_dyn())
        }
    }

    /// Emits class 0 for wide crops and class 1 for narrow ones, then blanks.
    #[derive(Debug)]
    struct WidthRecognizer {
        wide_from: usize,
    }

    impl InferenceEngine for WidthRecognizer {
        fn model_name(&self) -> &str {
            "width_rec"
        }

        fn infer(&self, input: &Tensor4D) -> Result<TensorD, OCRError> {
            let (_, channels, height, width) = input.dim();
            assert_eq!(channels, 3);
            assert_eq!(height, 48);
            let steps = (width / 8).max(2);
            let mut scores = Tensor3D::zeros((1, steps, 3));
            let class = if width >= self.wide_from { 0 } else { 1 };
            scores[[0, 0, class]] = 5.0;
            for t in 1..steps {
                scores[[0, t, 2]] = 5.0;
            }
            Ok(scores.into_dyn())
        }
    }

    fn config(parallel: bool) -> PaddleOcrConfig {
        let mut config = PaddleOcrConfig::new("det.onnx", "rec.onnx", "dict.txt");
        config.detection.target_size = [128, 128];
        config.parallel_regions = parallel;
        config
    }

    fn pipeline(
        blobs: Vec<(usize, usize, usize, usize)>,
        parallel: bool,
        character: &[&str],
    ) -> OcrPipeline {
        OcrPipeline::new(
            Arc::new(BlobDetector { blobs, channels: 1 }),
            Arc::new(WidthRecognizer { wide_from: 50 }),
            &config(parallel),
            character.iter().map(|c| c.to_string()).collect(),
        )
        .unwrap()
    }

    fn image() -> RgbImage {
        RgbImage::from_pixel(256, 192, Rgb([200, 200, 200]))
    }

    #[test]
    fn test_single_blob_yields_one_enclosing_result() {
        let pipeline = pipeline(vec![(20, 30, 40, 90)], false, &["w", "n"]);
        let results = pipeline.run(&image()).unwrap();
        assert_eq!(results.len(), 1);

        let result = &results[0];
        assert_eq!(result.text, "w");
        assert!(result.confidence > 0.9);

        // Blob pixels span x 30..=89, y 20..=39 on the 128x128 input,
        // i.e. x 60..=178, y 30..=58.5 on the 256x192 original.
        let rect = result.rect();
        assert!(rect.left <= 60.0 && rect.right >= 178.0, "{rect:?}");
        assert!(rect.top <= 30.0 && rect.bottom >= 58.5, "{rect:?}");
        assert!(rect.right <= 256.0 && rect.bottom <= 192.0);
    }

    #[test]
    fn test_empty_heatmap_yields_no_results() {
        let pipeline = pipeline(Vec::new(), false, &["w", "n"]);
        assert!(pipeline.run(&image()).unwrap().is_empty());
    }

    #[test]
    fn test_results_follow_scan_order_in_parallel() {
        let blobs = vec![(60, 10, 80, 30), (10, 60, 20, 120)];
        let sequential = pipeline(blobs.clone(), false, &["w", "n"])
            .run(&image())
            .unwrap();
        let parallel = pipeline(blobs, true, &["w", "n"]).run(&image()).unwrap();

        let texts: Vec<&str> = sequential.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["w", "n"]);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_region_on_left_edge_is_recognized() {
        let pipeline = pipeline(vec![(0, 0, 20, 60), (70, 0, 90, 20)], false, &["w", "n"]);
        let results = pipeline.run(&image()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "w");
        assert_eq!(results[0].rect().left, 0.0);
        assert_eq!(results[0].rect().top, 0.0);
        assert_eq!(results[1].rect().left, 0.0);
    }

    #[test]
    fn test_corner_band_does_not_fail_other_regions() {
        let run = |parallel: bool| {
            let mut config = config(parallel);
            config.detection.smooth_heatmap = false;
            OcrPipeline::new(
                Arc::new(PaintDetector {
                    paint: |x, y| {
                        // A steep band leaving the top-left corner, plus a block further down.
                        let band = x < 30 && (y as f32 - 1.4 * x as f32).abs() <= 4.0;
                        let block = (90..110).contains(&y) && (40..100).contains(&x);
                        band || block
                    },
                }),
                Arc::new(WidthRecognizer { wide_from: 50 }),
                &config,
                vec!["w".to_string(), "n".to_string()],
            )
            .unwrap()
            .run(&image())
            .unwrap()
        };

        let sequential = run(false);
        assert!(sequential.iter().any(|r| r.text == "w" && r.rect().top >= 100.0));
        assert_eq!(sequential, run(true));
    }

    #[test]
    fn test_detector_shape_mismatch_is_an_error() {
        let pipeline = OcrPipeline::new(
            Arc::new(BlobDetector {
                blobs: vec![(20, 30, 40, 90)],
                channels: 2,
            }),
            Arc::new(WidthRecognizer { wide_from: 50 }),
            &config(false),
            vec!["w".to_string(), "n".to_string()],
        )
        .unwrap();
        assert!(matches!(
            pipeline.run(&image()),
            Err(OCRError::Inference { .. })
        ));
    }

    #[test]
    fn test_short_character_table_fails_the_request() {
        let pipeline = pipeline(vec![(20, 30, 40, 90)], false, &["w"]);
        assert!(matches!(
            pipeline.run(&image()),
            Err(OCRError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let pipeline = pipeline(Vec::new(), false, &["w", "n"]);
        assert!(pipeline.run(&RgbImage::new(0, 0)).is_err());
    }
}
