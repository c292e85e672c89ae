//! Perspective rectification of text regions.
//!
//! A detected region is an arbitrary quadrilateral; the recognizer wants an
//! upright strip of fixed height. The functions here solve the projective
//! transform between the two and resample the source with inverse mapping.

use image::{Rgb, RgbImage};
use nalgebra::{DMatrix, DVector, Matrix3, RowDVector, Vector3};
use rayon::prelude::*;
use tracing::trace;

use crate::core::OCRError;
use crate::processors::{OrientedBox, Point};

/// Warps the region described by `bbox` into an upright crop.
///
/// The crop width is `floor(max(|tr - tl|, |br - bl|))` and its height is
/// always `target_height`. Pixels that map outside the source are black.
///
/// Returns `Ok(None)` for degenerate geometry, which callers drop without
/// failing the request: zero width or height, coincident or collinear
/// corners (a box clipped against an image corner can collapse this way),
/// and corners for which no projective transform exists.
///
/// # Errors
///
/// Returns an error if `target_height` is zero.
pub fn rectify_crop(
    src_image: &RgbImage,
    bbox: &OrientedBox,
    target_height: u32,
) -> Result<Option<RgbImage>, OCRError> {
    if target_height == 0 {
        return Err(OCRError::config_error(
            "rectified crop height must be positive",
        ));
    }

    let [tl, tr, br, bl] = *bbox.points();
    let width = tl.distance(&tr).max(bl.distance(&br)).floor();
    let side = tl.distance(&bl).max(tr.distance(&br));
    if width < 1.0 || side <= f32::EPSILON || is_collapsed(&[tl, tr, br, bl]) {
        trace!("Dropping degenerate region {:?}", bbox);
        return Ok(None);
    }

    let width = width as u32;
    let h = target_height as f32;
    let dst = [
        Point::new(0.0, 0.0),
        Point::new(width as f32, 0.0),
        Point::new(width as f32, h),
        Point::new(0.0, h),
    ];

    let warped = get_perspective_transform(&[tl, tr, br, bl], &dst)
        .and_then(|matrix| warp_perspective(src_image, &matrix, width, target_height));
    if warped.is_none() {
        trace!("No perspective transform for region {:?}", bbox);
    }
    Ok(warped)
}

/// Smallest corner separation and triangle area a quad needs to be warped.
const MIN_CORNER_DISTANCE: f32 = 0.5;
const MIN_CORNER_AREA: f32 = 0.25;

/// True when two corners coincide or three consecutive corners are collinear.
fn is_collapsed(quad: &[Point; 4]) -> bool {
    (0..4).any(|i| {
        let prev = quad[(i + 3) % 4];
        let cur = quad[i];
        let next = quad[(i + 1) % 4];
        let twice_area = ((cur.x - prev.x) * (next.y - prev.y)
            - (cur.y - prev.y) * (next.x - prev.x))
            .abs();
        cur.distance(&next) < MIN_CORNER_DISTANCE || twice_area < 2.0 * MIN_CORNER_AREA
    })
}

/// Solves the 3x3 homography mapping each `src[i]` onto `dst[i]`.
///
/// Returns `None` when the corners admit no such transform.
pub(crate) fn get_perspective_transform(
    src: &[Point; 4],
    dst: &[Point; 4],
) -> Option<Matrix3<f32>> {
    let mut a = DMatrix::<f32>::zeros(8, 8);
    let mut b = DVector::<f32>::zeros(8);

    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        a.set_row(
            i * 2,
            &RowDVector::from_row_slice(&[
                s.x,
                s.y,
                1.0,
                0.0,
                0.0,
                0.0,
                -s.x * d.x,
                -s.y * d.x,
            ]),
        );
        b[i * 2] = d.x;

        a.set_row(
            i * 2 + 1,
            &RowDVector::from_row_slice(&[
                0.0,
                0.0,
                0.0,
                s.x,
                s.y,
                1.0,
                -s.x * d.y,
                -s.y * d.y,
            ]),
        );
        b[i * 2 + 1] = d.y;
    }

    let solution = a.lu().solve(&b)?;
    if solution.iter().any(|v| !v.is_finite()) {
        return None;
    }

    Some(Matrix3::new(
        solution[0],
        solution[1],
        solution[2],
        solution[3],
        solution[4],
        solution[5],
        solution[6],
        solution[7],
        1.0,
    ))
}

/// Resamples `src_image` through the inverse of `transform`.
///
/// Rows are filled in parallel.
fn warp_perspective(
    src_image: &RgbImage,
    transform: &Matrix3<f32>,
    dst_width: u32,
    dst_height: u32,
) -> Option<RgbImage> {
    let inv = transform.try_inverse()?;

    let mut dst_image = RgbImage::new(dst_width, dst_height);
    let (src_width, src_height) = src_image.dimensions();
    if src_width == 0 || src_height == 0 {
        return Some(dst_image);
    }
    let max_x = (src_width - 1) as f32;
    let max_y = (src_height - 1) as f32;

    let buffer: &mut [u8] = dst_image.as_mut();
    buffer
        .par_chunks_mut((dst_width * 3) as usize)
        .enumerate()
        .for_each(|(dst_y, row)| {
            for dst_x in 0..dst_width {
                let src = inv * Vector3::new(dst_x as f32, dst_y as f32, 1.0);

                let mut pixel = Rgb([0, 0, 0]);
                if src.z.abs() > f32::EPSILON {
                    let sx = src.x / src.z;
                    let sy = src.y / src.z;
                    if (0.0..=max_x).contains(&sx) && (0.0..=max_y).contains(&sy) {
                        pixel = bilinear_interpolate(src_image, sx, sy);
                    }
                }

                let idx = (dst_x * 3) as usize;
                row[idx..idx + 3].copy_from_slice(&pixel.0);
            }
        });

    Some(dst_image)
}

/// Samples `image` at a fractional position inside its bounds.
fn bilinear_interpolate(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let x1 = x.floor() as u32;
    let y1 = y.floor() as u32;
    let x2 = (x1 + 1).min(image.width() - 1);
    let y2 = (y1 + 1).min(image.height() - 1);

    let dx = x - x1 as f32;
    let dy = y - y1 as f32;

    let p11 = image.get_pixel(x1, y1);
    let p12 = image.get_pixel(x1, y2);
    let p21 = image.get_pixel(x2, y1);
    let p22 = image.get_pixel(x2, y2);

    let mut result = [0u8; 3];
    for (i, channel) in result.iter_mut().enumerate() {
        let val = (1.0 - dx) * (1.0 - dy) * p11.0[i] as f32
            + dx * (1.0 - dy) * p21.0[i] as f32
            + (1.0 - dx) * dy * p12.0[i] as f32
            + dx * dy * p22.0[i] as f32;
        *channel = val.round().clamp(0.0, 255.0) as u8;
    }

    Rgb(result)
}
