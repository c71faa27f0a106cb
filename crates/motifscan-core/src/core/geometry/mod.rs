//! Geometry kernel: point helpers, a 3×3 Jacobi SVD and Kabsch superposition.

pub mod superposition;
pub mod svd;

use nalgebra::{Point3, Vector3};

pub use superposition::{Alignment, SuperpositionError, superimpose};

pub type Point = Point3<f64>;

/// Sets whose spread is below this are treated as coincident.
const COINCIDENT_EPSILON: f64 = 1e-9;
/// Relative off-axis spread below which a point set counts as collinear.
const COLLINEAR_EPSILON: f64 = 1e-6;

pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point::from(sum / points.len() as f64))
}

pub fn distance(a: &Point, b: &Point) -> f64 {
    (a - b).norm()
}

/// All `i < j` pairwise distances, in row-major order of the upper triangle.
pub fn pairwise_distances(points: &[Point]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len() * points.len().saturating_sub(1) / 2);
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            out.push(distance(&points[i], &points[j]));
        }
    }
    out
}

/// True when the points do not span a plane: fewer than three points, all
/// points coincident, or every point lying on one line.
pub fn is_degenerate(points: &[Point]) -> bool {
    if points.len() < 3 {
        return true;
    }
    let Some(center) = centroid(points) else {
        return true;
    };
    let centered: Vec<Vector3<f64>> = points.iter().map(|p| p - center).collect();

    let Some(axis) = centered
        .iter()
        .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))
    else {
        return true;
    };
    let scale = axis.norm();
    if scale < COINCIDENT_EPSILON {
        return true;
    }

    let axis = axis / scale;
    let off_axis = centered
        .iter()
        .map(|v| axis.cross(v).norm())
        .fold(0.0_f64, f64::max);
    off_axis <= COLLINEAR_EPSILON * scale
}
