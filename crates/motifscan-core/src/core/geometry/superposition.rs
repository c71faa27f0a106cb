use super::svd::svd3;
use super::{Point, centroid, is_degenerate};
use nalgebra::{Matrix3, Rotation3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SuperpositionError {
    #[error("Point sets differ in size or are empty (reference: {reference}, candidate: {candidate})")]
    MismatchedSize { reference: usize, candidate: usize },
    #[error("Point set is degenerate (fewer than three points, or collinear/coincident)")]
    DegenerateGeometry,
}

/// Optimal rigid-body superposition of a candidate point set onto a reference.
///
/// `rotation` is always proper (det = +1). [`Alignment::apply`] maps a point in
/// the candidate frame into the reference frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    rotation: Rotation3<f64>,
    translation: Vector3<f64>,
    rmsd: f64,
}

impl Alignment {
    pub fn rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    pub fn rmsd(&self) -> f64 {
        self.rmsd
    }

    pub fn apply(&self, point: &Point) -> Point {
        self.rotation * point + self.translation
    }

    pub fn transform(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.apply(p)).collect()
    }

    /// The alignment of the reference onto the candidate. RMSD is unchanged.
    pub fn inverse(&self) -> Alignment {
        let rotation = self.rotation.inverse();
        let translation = -(rotation * self.translation);
        Alignment {
            rotation,
            translation,
            rmsd: self.rmsd,
        }
    }
}

/// Kabsch superposition of `candidate` onto `reference`. Points correspond by
/// index.
pub fn superimpose(reference: &[Point], candidate: &[Point]) -> Result<Alignment, SuperpositionError> {
    if reference.len() != candidate.len() || reference.is_empty() {
        return Err(SuperpositionError::MismatchedSize {
            reference: reference.len(),
            candidate: candidate.len(),
        });
    }
    if is_degenerate(reference) || is_degenerate(candidate) {
        return Err(SuperpositionError::DegenerateGeometry);
    }

    let (Some(ref_center), Some(cand_center)) = (centroid(reference), centroid(candidate)) else {
        return Err(SuperpositionError::DegenerateGeometry);
    };

    let covariance = reference
        .iter()
        .zip(candidate)
        .fold(Matrix3::zeros(), |acc, (r, c)| {
            acc + (c - cand_center) * (r - ref_center).transpose()
        });

    let svd = svd3(&covariance);
    let handedness = (svd.v * svd.u.transpose()).determinant();
    let d = if handedness < 0.0 { -1.0 } else { 1.0 };
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d));
    let rotation_matrix = svd.v * correction * svd.u.transpose();

    let rotation = Rotation3::from_matrix_unchecked(rotation_matrix);
    let translation = ref_center.coords - rotation * cand_center.coords;

    let sum_sq: f64 = reference
        .iter()
        .zip(candidate)
        .map(|(r, c)| (rotation * c + translation - r).norm_squared())
        .sum();
    let rmsd = (sum_sq / reference.len() as f64).sqrt();

    Ok(Alignment {
        rotation,
        translation,
        rmsd,
    })
}
