use crate::engine::error::EngineError;
use nalgebra::DMatrix;

/// Largest asymmetry tolerated when building a matrix from raw rows.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Symmetric matrix of pairwise distances (RMSD, Å) between labeled items,
/// with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    labels: Vec<String>,
    values: DMatrix<f64>,
}

impl DistanceMatrix {
    pub(crate) fn zeros(labels: Vec<String>) -> Self {
        let n = labels.len();
        Self {
            labels,
            values: DMatrix::zeros(n, n),
        }
    }

    /// Builds a matrix from explicit rows, checking shape, symmetry, a zero
    /// diagonal and non-negative finite entries.
    pub fn from_rows(labels: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, EngineError> {
        let n = labels.len();
        if rows.len() != n || rows.iter().any(|row| row.len() != n) {
            return Err(EngineError::Clustering(format!(
                "distance matrix must be {n}x{n} to match its labels"
            )));
        }
        let mut matrix = Self::zeros(labels);
        for i in 0..n {
            if rows[i][i] != 0.0 {
                return Err(EngineError::Clustering(format!(
                    "diagonal entry {i} must be zero, got {}",
                    rows[i][i]
                )));
            }
            for j in (i + 1)..n {
                let (a, b) = (rows[i][j], rows[j][i]);
                if !a.is_finite() || a < 0.0 || (a - b).abs() > SYMMETRY_TOLERANCE {
                    return Err(EngineError::Clustering(format!(
                        "entries ({i}, {j}) = {a} and ({j}, {i}) = {b} must be equal, finite and non-negative"
                    )));
                }
                matrix.set(i, j, a);
            }
        }
        Ok(matrix)
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[(i, j)] = value;
        self.values[(j, i)] = value;
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, i: usize) -> &str {
        &self.labels[i]
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Off-diagonal entries of the upper triangle, row-major.
    pub fn upper_triangle(&self) -> Vec<f64> {
        let n = self.len();
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| self.get(i, j))
            .collect()
    }

    /// The member of `members` with the smallest summed distance to the
    /// others; ties go to the member listed first.
    pub fn medoid(&self, members: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &candidate in members {
            let total: f64 = members.iter().map(|&other| self.get(candidate, other)).sum();
            if best.is_none_or(|(_, best_total)| total < best_total) {
                best = Some((candidate, total));
            }
        }
        best.map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("m{i}")).collect()
    }

    #[test]
    fn from_rows_accepts_symmetric_input() {
        let matrix = DistanceMatrix::from_rows(
            labels(3),
            &[vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 3.0], vec![2.0, 3.0, 0.0]],
        )
        .unwrap();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.get(2, 1), 3.0);
        assert_eq!(matrix.upper_triangle(), vec![1.0, 2.0, 3.0]);
        assert_eq!(matrix.label(1), "m1");
    }

    #[test]
    fn from_rows_rejects_malformed_input() {
        assert!(DistanceMatrix::from_rows(labels(2), &[vec![0.0, 1.0]]).is_err());
        assert!(DistanceMatrix::from_rows(labels(2), &[vec![0.0, 1.0], vec![2.0, 0.0]]).is_err());
        assert!(DistanceMatrix::from_rows(labels(2), &[vec![0.5, 1.0], vec![1.0, 0.0]]).is_err());
        assert!(DistanceMatrix::from_rows(labels(2), &[vec![0.0, -1.0], vec![-1.0, 0.0]]).is_err());
    }

    #[test]
    fn medoid_minimizes_summed_distance() {
        let matrix = DistanceMatrix::from_rows(
            labels(3),
            &[vec![0.0, 1.0, 4.0], vec![1.0, 0.0, 2.0], vec![4.0, 2.0, 0.0]],
        )
        .unwrap();
        assert_eq!(matrix.medoid(&[0, 1, 2]), Some(1));
        assert_eq!(matrix.medoid(&[0, 2]), Some(0));
        assert_eq!(matrix.medoid(&[]), None);
    }
}
