use image::GrayImage;
use image::imageops;
use imageproc::contours::{BorderType, find_contours};
use tracing::debug;

use super::DBPostProcess;
use crate::processors::geometry::{OrientedBox, Polygon};

impl DBPostProcess {
    /// Traces the outer boundary of every 8-connected foreground region.
    ///
    /// Regions whose boundary encloses less than `min_area` are skipped; the
    /// rest are simplified with a tolerance of `poly_approx_eps` times their
    /// perimeter. Output order follows the row-major scan that discovered them.
    ///
    /// The mask is traced inside a one-pixel background frame: `find_contours`
    /// reports regions touching the first column as holes otherwise.
    pub fn polygons_from_bitmap(&self, mask: &GrayImage) -> Vec<Polygon> {
        let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
        imageops::replace(&mut framed, mask, 1, 1);

        find_contours::<u32>(&framed)
            .into_iter()
            .filter(|contour| matches!(contour.border_type, BorderType::Outer))
            .filter_map(|contour| {
                let boundary = Polygon::from_contour(&contour).translate(-1.0, -1.0);
                let area = boundary.area();
                if area < self.min_area || area <= 0.0 {
                    debug!(
                        "Skipping region with area {:.1} (min {:.1})",
                        area, self.min_area
                    );
                    return None;
                }
                let epsilon = self.poly_approx_eps * boundary.perimeter();
                Some(boundary.approx_poly_dp(epsilon))
            })
            .collect()
    }

    /// Fits an oriented box, clips it to the image and enforces the minimum area.
    pub fn fit_box(&self, polygon: &Polygon, width: u32, height: u32) -> Option<OrientedBox> {
        let fitted = OrientedBox::fit(polygon)?;
        let clipped = fitted.clip(width, height);
        let area = clipped.area();
        if area < self.min_area || area <= 0.0 {
            debug!("Dropping box with clipped area {:.1}", area);
            return None;
        }
        Some(clipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::geometry::Point;
    use image::Luma;

    fn mask_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let inside = rects
                .iter()
                .any(|&(x0, y0, x1, y1)| x >= x0 && x < x1 && y >= y0 && y < y1);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_all_zero_mask_has_no_polygons() {
        let post = DBPostProcess::default();
        let mask = GrayImage::new(40, 30);
        assert!(post.polygons_from_bitmap(&mask).is_empty());
    }

    #[test]
    fn test_rectangle_region_simplifies_to_four_corners() {
        let post = DBPostProcess::default();
        let mask = mask_with_rects(64, 48, &[(10, 20, 30, 30)]);
        let polygons = post.polygons_from_bitmap(&mask);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 4);
        assert!((polygons[0].area() - 19.0 * 9.0).abs() < 1e-3);
    }

    #[test]
    fn test_hole_does_not_create_a_second_polygon() {
        let post = DBPostProcess::default();
        let mut mask = mask_with_rects(64, 64, &[(10, 10, 50, 50)]);
        for y in 20..40 {
            for x in 20..40 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        assert_eq!(post.polygons_from_bitmap(&mask).len(), 1);
    }

    #[test]
    fn test_diagonal_pixels_form_one_region() {
        let post = DBPostProcess {
            min_area: 1.0,
            ..DBPostProcess::default()
        };
        let mask = mask_with_rects(40, 40, &[(5, 5, 15, 15), (15, 15, 25, 25)]);
        assert_eq!(post.polygons_from_bitmap(&mask).len(), 1);
    }

    #[test]
    fn test_regions_touching_image_edges() {
        let post = DBPostProcess::default();
        let cases = [
            (0, 10, 20, 20),
            (0, 0, 20, 10),
            (10, 0, 30, 10),
            (20, 30, 40, 40),
            (25, 15, 40, 25),
        ];
        for rect in cases {
            let mask = mask_with_rects(40, 40, &[rect]);
            let polygons = post.polygons_from_bitmap(&mask);
            assert_eq!(polygons.len(), 1, "region {rect:?}");

            let (x0, y0, x1, y1) = rect;
            let (left, top, right, bottom) = polygons[0].points.iter().fold(
                (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
                |(l, t, r, b), p| (l.min(p.x), t.min(p.y), r.max(p.x), b.max(p.y)),
            );
            assert_eq!(
                (left, top, right, bottom),
                (x0 as f32, y0 as f32, (x1 - 1) as f32, (y1 - 1) as f32),
                "region {rect:?}"
            );
        }
    }

    #[test]
    fn test_full_mask_is_one_region() {
        let post = DBPostProcess::default();
        let mask = mask_with_rects(16, 12, &[(0, 0, 16, 12)]);
        let polygons = post.polygons_from_bitmap(&mask);
        assert_eq!(polygons.len(), 1);
        assert!((polygons[0].area() - 15.0 * 11.0).abs() < 1e-3);
    }

    #[test]
    fn test_fit_box_clips_to_image() {
        let post = DBPostProcess::default();
        let polygon = Polygon::new(vec![
            Point::new(-4.0, -4.0),
            Point::new(30.0, -4.0),
            Point::new(30.0, 10.0),
            Point::new(-4.0, 10.0),
        ]);
        let fitted = post.fit_box(&polygon, 20, 20).unwrap();
        let (left, top, right, bottom) = fitted.bounds();
        assert_eq!((left, top, right), (0.0, 0.0, 19.0));
        assert!((bottom - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_fit_box_drops_tiny_boxes() {
        let post = DBPostProcess::default();
        let polygon = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ]);
        assert!(post.fit_box(&polygon, 20, 20).is_none());
    }
}
