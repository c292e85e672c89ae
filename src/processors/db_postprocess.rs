//! Post-processing for DB (Differentiable Binarization) text detection models.
//!
//! The [`DBPostProcess`] struct turns a detector heatmap into oriented text
//! boxes: the heatmap is binarized, every connected foreground region is
//! traced and simplified into a polygon, the polygon is expanded (unclipped)
//! and a minimum area rectangle is fitted around it. Mask preparation and
//! contour handling live in helper modules next to this file.

#[path = "db_bitmap.rs"]
mod db_bitmap;
#[path = "db_mask.rs"]
mod db_mask;

use image::GrayImage;
use ndarray::ArrayView2;
use tracing::debug;

use crate::core::config::DetectionConfig;
use crate::processors::geometry::{OrientedBox, Polygon};
use crate::processors::unclip::unclip;

/// Post-processor for DB text detection heatmaps.
#[derive(Debug, Clone)]
pub struct DBPostProcess {
    /// Probability above which a heatmap pixel counts as text.
    pub box_threshold: f32,
    /// Regions and boxes with a smaller area are dropped.
    pub min_area: f32,
    /// Expansion ratio handed to [`unclip`].
    pub unclip_ratio: f32,
    /// Douglas-Peucker tolerance as a fraction of the region perimeter.
    pub poly_approx_eps: f32,
    /// Whether the heatmap is smoothed before thresholding.
    pub smooth_heatmap: bool,
}

impl Default for DBPostProcess {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl DBPostProcess {
    /// Creates a post-processor from detection settings.
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            box_threshold: config.box_threshold,
            min_area: config.min_area,
            unclip_ratio: config.unclip_ratio,
            poly_approx_eps: config.poly_approx_eps,
            smooth_heatmap: config.smooth_heatmap,
        }
    }

    /// Runs binarization, polygon extraction, expansion and box fitting.
    ///
    /// Boxes are expressed in heatmap pixel coordinates and come out in the
    /// order their regions were discovered by a row-major scan.
    pub fn apply(&self, heatmap: &ArrayView2<f32>) -> Vec<OrientedBox> {
        let (height, width) = heatmap.dim();
        let mask = self.binarize(heatmap);
        let polygons = self.polygons_from_bitmap(&mask);
        let candidates = polygons.len();

        let boxes: Vec<OrientedBox> = polygons
            .iter()
            .filter_map(|polygon| self.expand_polygon(polygon))
            .filter_map(|polygon| self.fit_box(&polygon, width as u32, height as u32))
            .collect();

        debug!(
            "DB post-processing kept {} of {} regions on a {}x{} heatmap",
            boxes.len(),
            candidates,
            width,
            height
        );
        boxes
    }

    /// Thresholds the heatmap into a 0/255 mask, smoothing it first if enabled.
    pub fn binarize(&self, heatmap: &ArrayView2<f32>) -> GrayImage {
        if self.smooth_heatmap {
            let smoothed = db_mask::gaussian_smooth(heatmap);
            db_mask::threshold_mask(&smoothed.view(), self.box_threshold)
        } else {
            db_mask::threshold_mask(heatmap, self.box_threshold)
        }
    }

    /// Unclips a polygon; results with fewer than 4 vertices are dropped.
    pub fn expand_polygon(&self, polygon: &Polygon) -> Option<Polygon> {
        let expanded = unclip(polygon, self.unclip_ratio);
        if expanded.len() < 4 {
            debug!(
                "Dropping region with {} vertices after unclip",
                expanded.len()
            );
            return None;
        }
        Some(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn heatmap_with_blobs(
        width: usize,
        height: usize,
        blobs: &[(usize, usize, usize, usize)],
    ) -> Array2<f32> {
        let mut map = Array2::<f32>::zeros((height, width));
        for &(x0, y0, x1, y1) in blobs {
            for y in y0..y1 {
                for x in x0..x1 {
                    map[[y, x]] = 0.95;
                }
            }
        }
        map
    }

    #[test]
    fn test_empty_heatmap_yields_no_boxes() {
        let post = DBPostProcess::default();
        let map = Array2::<f32>::zeros((32, 48));
        assert!(post.apply(&map.view()).is_empty());
    }

    #[test]
    fn test_single_blob_yields_enclosing_box() {
        let post = DBPostProcess::default();
        let map = heatmap_with_blobs(100, 60, &[(20, 20, 60, 32)]);
        let boxes = post.apply(&map.view());
        assert_eq!(boxes.len(), 1);

        let (left, top, right, bottom) = boxes[0].bounds();
        assert!(left <= 20.0 && top <= 20.0, "{left} {top}");
        assert!(right >= 59.0 && bottom >= 31.0, "{right} {bottom}");
        assert!(right <= 99.0 && bottom <= 59.0);
    }

    #[test]
    fn test_blobs_come_out_in_scan_order() {
        let post = DBPostProcess::default();
        let map = heatmap_with_blobs(120, 80, &[(60, 50, 100, 60), (10, 10, 50, 20)]);
        let boxes = post.apply(&map.view());
        assert_eq!(boxes.len(), 2);
        assert!(boxes[0].top_left().y < boxes[1].top_left().y);
    }

    #[test]
    fn test_small_regions_are_dropped() {
        let post = DBPostProcess {
            min_area: 50.0,
            smooth_heatmap: false,
            ..DBPostProcess::default()
        };
        let map = heatmap_with_blobs(64, 64, &[(10, 10, 13, 13), (30, 30, 50, 40)]);
        let boxes = post.apply(&map.view());
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].top_left().x >= 25.0);
    }

    #[test]
    fn test_binarize_threshold() {
        let post = DBPostProcess {
            box_threshold: 0.5,
            smooth_heatmap: false,
            ..DBPostProcess::default()
        };
        let mut map = Array2::<f32>::zeros((2, 3));
        map[[0, 1]] = 0.5;
        map[[1, 2]] = 0.51;
        let mask = post.binarize(&map.view());
        assert_eq!(mask.get_pixel(1, 0).0[0], 0);
        assert_eq!(mask.get_pixel(2, 1).0[0], 255);
    }
}
