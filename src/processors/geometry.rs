//! Geometric primitives for text region post-processing.
//!
//! This module provides points, polygons and oriented boxes, together with
//! the algorithms the detection post-processor needs: shoelace area,
//! perimeter, convex hull, closed-curve Douglas-Peucker simplification and
//! the rotating-calipers minimum area rectangle.

use imageproc::contours::Contour;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Cross product of `p1 -> p2` and `p1 -> p3`.
///
/// Positive for a counter-clockwise turn in a y-up frame, negative for a
/// clockwise turn and zero for collinear points.
fn cross_product(p1: &Point, p2: &Point, p3: &Point) -> f32 {
    (p2.x - p1.x) * (p3.y - p1.y) - (p2.y - p1.y) * (p3.x - p1.x)
}

/// Shoelace area of a closed point sequence.
fn shoelace_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: f32 = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            points[i].x * points[j].y - points[j].x * points[i].y
        })
        .sum();
    twice.abs() / 2.0
}

/// A closed polygon that owns its vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// The vertices, in boundary order.
    pub points: Vec<Point>,
}

impl Polygon {
    /// Creates a new polygon from a vector of points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Creates a polygon from a traced contour.
    pub fn from_contour(contour: &Contour<u32>) -> Self {
        let points = contour
            .points
            .iter()
            .map(|p| Point::new(p.x as f32, p.y as f32))
            .collect();
        Self { points }
    }

    /// Shifts every vertex by `(dx, dy)`.
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        let points = self
            .points
            .into_iter()
            .map(|p| Point::new(p.x + dx, p.y + dy))
            .collect();
        Self { points }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true when the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Calculates the enclosed area using the shoelace formula.
    ///
    /// # Returns
    ///
    /// The area of the polygon. Returns 0.0 if the polygon has fewer than 3 points.
    pub fn area(&self) -> f32 {
        shoelace_area(&self.points)
    }

    /// Calculates the length of the closed boundary.
    pub fn perimeter(&self) -> f32 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| self.points[i].distance(&self.points[(i + 1) % n]))
            .sum()
    }

    /// Computes the convex hull with Graham's scan.
    ///
    /// # Returns
    ///
    /// The hull vertices. Polygons with fewer than 3 points are returned as-is.
    pub fn convex_hull(&self) -> Polygon {
        if self.points.len() < 3 {
            return self.clone();
        }

        let mut points = self.points.clone();

        // Lowest y, leftmost on ties.
        let start_idx = points
            .iter()
            .position_min_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
            .unwrap_or(0);
        points.swap(0, start_idx);
        let start_point = points[0];

        points[1..].sort_by(|a, b| {
            let cross = cross_product(&start_point, a, b);
            if cross == 0.0 {
                let dist_a = (a.x - start_point.x).powi(2) + (a.y - start_point.y).powi(2);
                let dist_b = (b.x - start_point.x).powi(2) + (b.y - start_point.y).powi(2);
                dist_a.total_cmp(&dist_b)
            } else if cross > 0.0 {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        });

        let mut hull: Vec<Point> = Vec::with_capacity(points.len());
        for point in points {
            while hull.len() > 1
                && cross_product(&hull[hull.len() - 2], &hull[hull.len() - 1], &point) <= 0.0
            {
                hull.pop();
            }
            hull.push(point);
        }

        Polygon::new(hull)
    }

    /// Computes the minimum area rectangle enclosing the polygon.
    ///
    /// Uses rotating calipers over the convex hull: one hull edge of an
    /// optimal rectangle is always collinear with a rectangle side.
    ///
    /// # Returns
    ///
    /// `None` when the polygon has fewer than 3 distinct, non-collinear points.
    pub fn min_area_rect(&self) -> Option<MinAreaRect> {
        let hull = self.convex_hull();
        let hull_points = &hull.points;
        if hull_points.len() < 3 {
            return None;
        }

        let mut best: Option<(f32, MinAreaRect)> = None;
        let n = hull_points.len();
        for i in 0..n {
            let origin = hull_points[i];
            let next = hull_points[(i + 1) % n];
            let edge_x = next.x - origin.x;
            let edge_y = next.y - origin.y;
            let edge_length = edge_x.hypot(edge_y);
            if edge_length < f32::EPSILON {
                continue;
            }

            // Unit vector along the edge and its perpendicular.
            let (ux, uy) = (edge_x / edge_length, edge_y / edge_length);
            let (vx, vy) = (-uy, ux);

            let mut min_u = f32::MAX;
            let mut max_u = f32::MIN;
            let mut min_v = f32::MAX;
            let mut max_v = f32::MIN;
            for p in hull_points {
                let dx = p.x - origin.x;
                let dy = p.y - origin.y;
                let proj_u = ux * dx + uy * dy;
                let proj_v = vx * dx + vy * dy;
                min_u = min_u.min(proj_u);
                max_u = max_u.max(proj_u);
                min_v = min_v.min(proj_v);
                max_v = max_v.max(proj_v);
            }

            let area = (max_u - min_u) * (max_v - min_v);
            if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
                let corner = |u: f32, v: f32| {
                    Point::new(origin.x + u * ux + v * vx, origin.y + u * uy + v * vy)
                };
                let rect = MinAreaRect {
                    corners: [
                        corner(min_u, min_v),
                        corner(max_u, min_v),
                        corner(max_u, max_v),
                        corner(min_u, max_v),
                    ],
                    width: max_u - min_u,
                    height: max_v - min_v,
                };
                best = Some((area, rect));
            }
        }

        best.map(|(_, rect)| rect)
    }

    /// Simplifies the closed polygon with the Douglas-Peucker algorithm.
    ///
    /// The curve is split at the vertex farthest from the first one and each
    /// half is simplified as an open curve, so the result does not depend on
    /// treating the closing edge specially.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Maximum allowed distance between the boundary and its simplification.
    pub fn approx_poly_dp(&self, epsilon: f32) -> Polygon {
        let n = self.points.len();
        if n <= 3 {
            return self.clone();
        }

        let first = self.points[0];
        let split = (1..n)
            .position_max_by(|&a, &b| {
                first
                    .distance(&self.points[a])
                    .total_cmp(&first.distance(&self.points[b]))
            })
            .map(|i| i + 1)
            .unwrap_or(n / 2);

        let mut forward = self.points[..=split].to_vec();
        let mut backward = self.points[split..].to_vec();
        backward.push(first);

        let forward_keep = douglas_peucker_keep(&forward, epsilon);
        let backward_keep = douglas_peucker_keep(&backward, epsilon);

        let mut simplified: Vec<Point> = forward
            .drain(..)
            .zip(forward_keep)
            .filter_map(|(p, keep)| keep.then_some(p))
            .collect();
        let last = backward.len() - 1;
        simplified.extend(
            backward
                .drain(..)
                .zip(backward_keep)
                .enumerate()
                .filter(|(i, _)| *i != 0 && *i != last)
                .filter_map(|(_, (p, keep))| keep.then_some(p)),
        );

        Polygon::new(simplified)
    }
}

/// Marks the vertices an open Douglas-Peucker pass keeps.
///
/// Iterative to stay safe on very long contours.
fn douglas_peucker_keep(points: &[Point], epsilon: f32) -> Vec<bool> {
    let n = points.len();
    let mut keep = vec![false; n];
    if n == 0 {
        return keep;
    }
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_index = start;
        for (i, point) in points.iter().enumerate().take(end).skip(start + 1) {
            let dist = point_to_line_distance(point, &points[start], &points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_index = i;
            }
        }

        if max_dist > epsilon {
            keep[max_index] = true;
            stack.push((start, max_index));
            stack.push((max_index, end));
        }
    }
    keep
}

/// Perpendicular distance from a point to the line through two points.
///
/// Falls back to the point distance when the line is degenerate.
fn point_to_line_distance(point: &Point, line_start: &Point, line_end: &Point) -> f32 {
    let a = line_end.y - line_start.y;
    let b = line_start.x - line_end.x;
    let c = line_end.x * line_start.y - line_start.x * line_end.y;

    let denominator = a.hypot(b);
    if denominator == 0.0 {
        return point.distance(line_start);
    }

    (a * point.x + b * point.y + c).abs() / denominator
}

/// A minimum area rectangle with its corners in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct MinAreaRect {
    /// Corners in boundary order; not yet canonically ordered.
    pub corners: [Point; 4],
    /// Length of the side collinear with the supporting hull edge.
    pub width: f32,
    /// Length of the perpendicular side.
    pub height: f32,
}

impl MinAreaRect {
    /// Gets the length of the shorter side of the rectangle.
    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

/// A quadrilateral in canonical corner order.
///
/// The corners are always `[top_left, top_right, bottom_right, bottom_left]`:
/// top-left has the smallest `x + y`, bottom-right the largest among the
/// rest, top-right the smallest `y - x` among the remaining two, and
/// bottom-left is the last one. Ties are broken on the coordinates, so the
/// order depends only on the set of corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrientedBox {
    points: [Point; 4],
}

impl OrientedBox {
    /// Builds a box from four corners given in any order.
    pub fn from_points(points: [Point; 4]) -> Self {
        Self {
            points: order_points(points),
        }
    }

    /// Builds an axis-aligned box from its edges.
    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::from_points([
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ])
    }

    /// Fits the minimum area rectangle around a polygon.
    ///
    /// # Returns
    ///
    /// `None` for degenerate polygons (fewer than 3 non-collinear points).
    pub fn fit(polygon: &Polygon) -> Option<Self> {
        polygon
            .min_area_rect()
            .map(|rect| Self::from_points(rect.corners))
    }

    /// The corners in canonical order.
    pub fn points(&self) -> &[Point; 4] {
        &self.points
    }

    pub fn top_left(&self) -> Point {
        self.points[0]
    }

    pub fn top_right(&self) -> Point {
        self.points[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.points[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.points[3]
    }

    /// Enclosed area.
    pub fn area(&self) -> f32 {
        shoelace_area(&self.points)
    }

    /// Clamps every corner into `[0, width - 1] x [0, height - 1]`.
    pub fn clip(&self, width: u32, height: u32) -> Self {
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;
        Self::from_points(
            self.points
                .map(|p| Point::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y))),
        )
    }

    /// Scales x and y independently.
    pub fn scale(&self, scale_x: f32, scale_y: f32) -> Self {
        Self::from_points(self.points.map(|p| Point::new(p.x * scale_x, p.y * scale_y)))
    }

    /// Axis-aligned bounds as `(left, top, right, bottom)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let (left, right) = self
            .points
            .iter()
            .map(|p| p.x)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .unwrap_or((0.0, 0.0));
        let (top, bottom) = self
            .points
            .iter()
            .map(|p| p.y)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .unwrap_or((0.0, 0.0));
        (left, top, right, bottom)
    }
}

/// Orders four corners as top-left, top-right, bottom-right, bottom-left.
pub fn order_points(points: [Point; 4]) -> [Point; 4] {
    let mut remaining = points.to_vec();

    let top_left = take_min_by(&mut remaining, |a, b| {
        (a.x + a.y)
            .total_cmp(&(b.x + b.y))
            .then(a.y.total_cmp(&b.y))
            .then(a.x.total_cmp(&b.x))
    });
    let bottom_right = take_min_by(&mut remaining, |a, b| {
        (b.x + b.y)
            .total_cmp(&(a.x + a.y))
            .then(b.y.total_cmp(&a.y))
            .then(b.x.total_cmp(&a.x))
    });
    let top_right = take_min_by(&mut remaining, |a, b| {
        (a.y - a.x)
            .total_cmp(&(b.y - b.x))
            .then(a.y.total_cmp(&b.y))
            .then(b.x.total_cmp(&a.x))
    });
    let bottom_left = take_min_by(&mut remaining, |a, b| {
        a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
    });

    [top_left, top_right, bottom_right, bottom_left]
}

fn take_min_by(points: &mut Vec<Point>, compare: impl Fn(&Point, &Point) -> Ordering) -> Point {
    let idx = points
        .iter()
        .position_min_by(|a, b| compare(a, b))
        .unwrap_or(0);
    points.swap_remove(idx)
}
