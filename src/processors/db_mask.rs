use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2};

use crate::core::constants::{GAUSSIAN_KERNEL_5, MASK_FOREGROUND};

/// Separable 5x5 Gaussian blur with reflect-101 borders.
pub(super) fn gaussian_smooth(heatmap: &ArrayView2<f32>) -> Array2<f32> {
    let (height, width) = heatmap.dim();
    let radius = (GAUSSIAN_KERNEL_5.len() / 2) as isize;

    let horizontal = Array2::<f32>::from_shape_fn((height, width), |(y, x)| {
        GAUSSIAN_KERNEL_5
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let sx = reflect_101(x as isize + k as isize - radius, width);
                w * heatmap[[y, sx]]
            })
            .sum()
    });

    Array2::<f32>::from_shape_fn((height, width), |(y, x)| {
        GAUSSIAN_KERNEL_5
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let sy = reflect_101(y as isize + k as isize - radius, height);
                w * horizontal[[sy, x]]
            })
            .sum()
    })
}

/// Maps an out-of-range index back inside `[0, len)` mirroring around the edge pixels.
fn reflect_101(mut idx: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let last = len as isize - 1;
    while idx < 0 || idx > last {
        idx = if idx < 0 { -idx } else { 2 * last - idx };
    }
    idx as usize
}

/// Pixels strictly above `threshold` become foreground.
pub(super) fn threshold_mask(heatmap: &ArrayView2<f32>, threshold: f32) -> GrayImage {
    let (height, width) = heatmap.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        if heatmap[[y as usize, x as usize]] > threshold {
            Luma([MASK_FOREGROUND])
        } else {
            Luma([0])
        }
    })
}
