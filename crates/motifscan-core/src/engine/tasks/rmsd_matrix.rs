use crate::core::geometry::{Alignment, Point, superimpose};
use crate::core::models::motif::StructuralMotif;
use crate::engine::clustering::DistanceMatrix;
use crate::engine::config::AtomSelection;
use crate::engine::correspondence::{atom_pairs, extend_points};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Superimposes `candidate` onto `reference`, pairing residues by position and
/// atoms by name under `selection`.
pub fn motif_alignment(
    reference: &StructuralMotif,
    candidate: &StructuralMotif,
    selection: &AtomSelection,
) -> Result<Alignment, EngineError> {
    if reference.len() != candidate.len() {
        return Err(EngineError::MismatchedSize {
            label: candidate.label().to_string(),
            expected: reference.len(),
            found: candidate.len(),
        });
    }

    let mut reference_points: Vec<Point> = Vec::new();
    let mut candidate_points: Vec<Point> = Vec::new();
    for (position, (r, c)) in reference.residues().iter().zip(candidate.residues()).enumerate() {
        let pairs = atom_pairs(r, c, selection);
        if pairs.is_empty() {
            return Err(EngineError::NoAtomCorrespondence {
                first: reference.label().to_string(),
                second: candidate.label().to_string(),
                position,
            });
        }
        extend_points(r, c, &pairs, &mut reference_points, &mut candidate_points);
    }

    Ok(superimpose(&reference_points, &candidate_points)?)
}

/// Pairwise RMSD between equally sized motifs, labeled by motif label.
#[instrument(skip_all, name = "rmsd_matrix_task")]
pub fn run(
    motifs: &[StructuralMotif],
    selection: &AtomSelection,
    reporter: &ProgressReporter,
) -> Result<DistanceMatrix, EngineError> {
    if let Some(first) = motifs.first() {
        if let Some(odd) = motifs.iter().find(|m| m.len() != first.len()) {
            return Err(EngineError::MismatchedSize {
                label: odd.label().to_string(),
                expected: first.len(),
                found: odd.len(),
            });
        }
    }

    let n = motifs.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();
    info!(motifs = n, pairs = pairs.len(), "Computing pairwise RMSD matrix.");
    reporter.report(Progress::TaskStart {
        total_steps: pairs.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = pairs.iter();

    #[cfg(feature = "parallel")]
    let iterator = pairs.par_iter();

    let results: Vec<Result<f64, EngineError>> = iterator
        .map(|&(i, j)| {
            let rmsd = motif_alignment(&motifs[i], &motifs[j], selection).map(|a| a.rmsd());
            reporter.report(Progress::TaskIncrement);
            rmsd
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let labels = motifs.iter().map(|m| m.label().to_string()).collect();
    let mut matrix = DistanceMatrix::zeros(labels);
    for (&(i, j), result) in pairs.iter().zip(results) {
        matrix.set(i, j, result?);
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::residue::{Residue, ResidueKey};
    use nalgebra::{Point3, Rotation3, Vector3};

    fn motif(label: &str, shift: f64) -> StructuralMotif {
        let rotation = Rotation3::from_euler_angles(shift, 0.3, -0.2);
        let residues = [("HIS", [0.0, 0.0, 0.0]), ("ASP", [5.0, 1.0, 0.0]), ("SER", [1.0, 4.0, 2.0])]
            .iter()
            .enumerate()
            .map(|(i, (name, [x, y, z]))| {
                let mut residue = Residue::new(ResidueKey::new('A', i as isize + 1), name);
                for (serial, (atom, dx)) in [("N", -1.0), ("CA", 0.0), ("C", 1.2f64)].iter().enumerate() {
                    let local = Point3::new(x + dx, y + dx.abs() * 0.5, *z);
                    let moved = rotation * local + Vector3::new(shift * 10.0, 0.0, 0.0);
                    residue.add_atom(Atom::new(serial + 1, atom, "", moved));
                }
                residue
            })
            .collect();
        StructuralMotif::new(label, residues)
    }

    #[test]
    fn rigid_copies_have_zero_rmsd() {
        let motifs = vec![motif("a", 0.0), motif("b", 1.0), motif("c", 2.0)];
        let matrix = run(&motifs, &AtomSelection::Backbone, &ProgressReporter::new()).unwrap();
        assert_eq!(matrix.labels(), &["a", "b", "c"]);
        for i in 0..3 {
            for j in 0..3 {
                assert!(matrix.get(i, j) < 1e-9);
            }
        }
    }

    #[test]
    fn size_mismatch_is_rejected_before_superposition() {
        let short = StructuralMotif::new("short", motif("x", 0.0).residues()[..2].to_vec());
        let motifs = vec![motif("a", 0.0), short];
        let err = run(&motifs, &AtomSelection::Backbone, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MismatchedSize {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn residues_without_shared_atoms_are_reported() {
        let a = motif("a", 0.0);
        let b = motif("b", 0.5);
        let custom = AtomSelection::Custom(vec!["OG".to_string()]);
        let err = motif_alignment(&a, &b, &custom).unwrap_err();
        assert!(matches!(err, EngineError::NoAtomCorrespondence { position: 0, .. }));
    }
}
