//! Image normalization for model input.
//!
//! Converts an RGB image into a `[1, 3, H, W]` tensor holding
//! `(px / 255 - mean[c]) / std[c]`, with the channels in the order the
//! network was trained on.

use image::RgbImage;

use crate::core::OCRError;
use crate::core::config::{ColorOrder, NormalizationConfig};
use crate::core::tensor::Tensor4D;

/// Normalizes images for model input.
///
/// The affine form `alpha * px + beta` is precomputed per channel, with
/// `alpha = scale / std` and `beta = -mean / std`.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std)
    pub alpha: [f32; 3],
    /// Offset values for each channel (beta = -mean / std)
    pub beta: [f32; 3],
    /// Channel order written into the tensor.
    pub color_order: ColorOrder,
}

impl NormalizeImage {
    /// Creates a new NormalizeImage instance with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `scale` - Optional scaling factor (defaults to 1.0/255.0)
    /// * `mean` - Mean values for each channel, in RGB order
    /// * `std` - Standard deviation values for each channel, in RGB order
    /// * `color_order` - Channel order of the output tensor
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Scale is less than or equal to 0
    /// * Mean or std don't have exactly 3 elements
    /// * Any standard deviation value is less than or equal to 0
    pub fn new(
        scale: Option<f32>,
        mean: &[f32],
        std: &[f32],
        color_order: ColorOrder,
    ) -> Result<Self, OCRError> {
        let scale = scale.unwrap_or(1.0 / 255.0);

        if scale <= 0.0 {
            return Err(OCRError::ConfigError {
                message: "Scale must be greater than 0".to_string(),
            });
        }

        let (Ok(mean), Ok(std)) = (<[f32; 3]>::try_from(mean), <[f32; 3]>::try_from(std)) else {
            return Err(OCRError::ConfigError {
                message: format!(
                    "Mean and std must have exactly 3 elements, got {} and {}",
                    mean.len(),
                    std.len()
                ),
            });
        };

        for (i, &s) in std.iter().enumerate() {
            if s.is_nan() || s <= 0.0 {
                return Err(OCRError::ConfigError {
                    message: format!(
                        "Standard deviation at index {i} must be greater than 0, got {s}"
                    ),
                });
            }
        }

        Ok(Self {
            alpha: std.map(|s| scale / s),
            beta: [0, 1, 2].map(|c| -mean[c] / std[c]),
            color_order,
        })
    }

    /// Builds a normalizer from configuration.
    pub fn from_config(config: &NormalizationConfig) -> Result<Self, OCRError> {
        Self::new(None, &config.mean, &config.std, config.color_order)
    }

    /// Converts an image into a `[1, 3, H, W]` tensor.
    ///
    /// The statistics are indexed by tensor plane, i.e. in the channel order
    /// fed to the network: with [`ColorOrder::Bgr`], `mean[0]` applies to blue.
    pub fn apply(&self, img: &RgbImage) -> Tensor4D {
        let (width, height) = img.dimensions();
        let source_channel = match self.color_order {
            ColorOrder::Rgb => [0, 1, 2],
            ColorOrder::Bgr => [2, 1, 0],
        };

        let mut tensor = Tensor4D::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in img.enumerate_pixels() {
            for (dst_c, &src_c) in source_channel.iter().enumerate() {
                let value = pixel.0[src_c] as f32;
                tensor[[0, dst_c, y as usize, x as usize]] =
                    self.alpha[dst_c] * value + self.beta[dst_c];
            }
        }
        tensor
    }
}
