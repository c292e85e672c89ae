//! Polygon expansion ("unclip").
//!
//! DB-style detectors are trained on shrunk text kernels, so every detected
//! polygon is grown back by an offset proportional to its area over its
//! perimeter before a box is fitted around it.

use clipper2::{EndType, JoinType, Path as ClipperPath};

use crate::processors::geometry::{Point, Polygon};

/// Grows a polygon outward with round joins.
///
/// The offset distance is `area * (ratio - 1) / perimeter`. When the offset
/// produces several contours the one with the largest area is kept.
///
/// # Returns
///
/// A copy of the input when its area or perimeter is zero, when the offset
/// is zero, or when offsetting yields nothing.
pub fn unclip(polygon: &Polygon, ratio: f32) -> Polygon {
    if polygon.len() < 3 {
        return polygon.clone();
    }

    let area = polygon.area() as f64;
    let perimeter = polygon.perimeter() as f64;
    if area <= f64::EPSILON || perimeter <= f64::EPSILON {
        return polygon.clone();
    }

    let delta = area * (ratio as f64 - 1.0) / perimeter;
    if delta.abs() <= f64::EPSILON {
        return polygon.clone();
    }

    let clipper_path: ClipperPath = polygon
        .points
        .iter()
        .map(|point| (point.x as f64, point.y as f64))
        .collect::<Vec<_>>()
        .into();

    let offset_paths = clipper_path.inflate(delta, JoinType::Round, EndType::Polygon, 2.0);

    let largest = offset_paths.into_iter().fold(None, |best: Option<(f64, _)>, path| {
        let path_area = path.signed_area().abs();
        match best {
            Some((best_area, _)) if best_area >= path_area => best,
            _ => Some((path_area, path)),
        }
    });

    match largest {
        Some((_, path)) if path.len() >= 3 => Polygon::new(
            path.iter()
                .map(|p| Point::new(p.x() as f32, p.y() as f32))
                .collect(),
        ),
        _ => polygon.clone(),
    }
}
