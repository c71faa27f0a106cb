use super::cancellation::CancellationToken;
use super::config::AtomSelection;
use super::correspondence::{atom_pairs, extend_points};
use crate::core::geometry::{Alignment, Point, SuperpositionError, superimpose};
use crate::core::models::residue::Residue;
use thiserror::Error;

/// RMSD differences at or below this are ties; the earlier permutation wins.
const RMSD_TIE_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("No family-compatible assignment exists for this candidate")]
    NoCompatibleAssignment,
    #[error("Assignment search was cancelled")]
    Cancelled,
    #[error(transparent)]
    Superposition(#[from] SuperpositionError),
}

/// The best correspondence found for one candidate subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// `permutation[i]` is the candidate index matched to query residue `i`.
    pub permutation: Vec<usize>,
    pub alignment: Alignment,
}

/// Finds, for a candidate subset, the family-compatible one-to-one mapping onto
/// the query residues that gives the lowest RMSD.
pub struct AssignmentEngine<'a> {
    query: &'a [Residue],
    selection: &'a AtomSelection,
}

impl<'a> AssignmentEngine<'a> {
    pub fn new(query: &'a [Residue], selection: &'a AtomSelection) -> Self {
        Self { query, selection }
    }

    /// Permutations are enumerated in lexicographic order by backtracking, and
    /// a branch is abandoned at the first incompatible position. A pair is
    /// usable only when the query residue accepts the candidate and the two
    /// share at least one selected atom.
    ///
    /// A permutation whose atoms are degenerate is skipped; if every compatible
    /// permutation is degenerate the candidate fails with `DegenerateGeometry`.
    /// Mismatched point sets abort the search with `MismatchedSize`.
    pub fn best_assignment(
        &self,
        candidates: &[&Residue],
        cancellation: Option<&CancellationToken>,
    ) -> Result<Assignment, AssignmentError> {
        let k = self.query.len();
        if candidates.len() != k {
            return Err(SuperpositionError::MismatchedSize {
                reference: k,
                candidate: candidates.len(),
            }
            .into());
        }

        let pairs: Vec<Vec<Option<Vec<(usize, usize)>>>> = self
            .query
            .iter()
            .map(|q| {
                candidates
                    .iter()
                    .map(|c| {
                        if !q.accepts(c) {
                            return None;
                        }
                        let pairs = atom_pairs(q, c, self.selection);
                        (!pairs.is_empty()).then_some(pairs)
                    })
                    .collect()
            })
            .collect();

        let mut search = PermutationSearch {
            query: self.query,
            candidates,
            pairs: &pairs,
            cancellation,
            permutation: Vec::with_capacity(k),
            used: vec![false; k],
            best: None,
            saw_degenerate: false,
            failure: None,
            cancelled: false,
        };
        search.descend();

        if let Some(error) = search.failure {
            return Err(error.into());
        }
        if search.cancelled {
            return Err(AssignmentError::Cancelled);
        }
        match search.best {
            Some(best) => Ok(best),
            None if search.saw_degenerate => Err(SuperpositionError::DegenerateGeometry.into()),
            None => Err(AssignmentError::NoCompatibleAssignment),
        }
    }
}

struct PermutationSearch<'s> {
    query: &'s [Residue],
    candidates: &'s [&'s Residue],
    pairs: &'s [Vec<Option<Vec<(usize, usize)>>>],
    cancellation: Option<&'s CancellationToken>,
    permutation: Vec<usize>,
    used: Vec<bool>,
    best: Option<Assignment>,
    saw_degenerate: bool,
    failure: Option<SuperpositionError>,
    cancelled: bool,
}

impl PermutationSearch<'_> {
    fn stopped(&self) -> bool {
        self.cancelled || self.failure.is_some()
    }

    fn descend(&mut self) {
        if self.stopped() {
            return;
        }
        let position = self.permutation.len();
        if position == self.query.len() {
            self.evaluate();
            return;
        }
        for j in 0..self.candidates.len() {
            if self.used[j] || self.pairs[position][j].is_none() {
                continue;
            }
            self.used[j] = true;
            self.permutation.push(j);
            self.descend();
            self.permutation.pop();
            self.used[j] = false;
            if self.stopped() {
                return;
            }
        }
    }

    fn evaluate(&mut self) {
        if self.cancellation.is_some_and(CancellationToken::is_cancelled) {
            self.cancelled = true;
            return;
        }

        let mut query_points: Vec<Point> = Vec::new();
        let mut candidate_points: Vec<Point> = Vec::new();
        for (i, &j) in self.permutation.iter().enumerate() {
            if let Some(pairs) = &self.pairs[i][j] {
                extend_points(
                    &self.query[i],
                    self.candidates[j],
                    pairs,
                    &mut query_points,
                    &mut candidate_points,
                );
            }
        }

        match superimpose(&query_points, &candidate_points) {
            Ok(alignment) => {
                let improves = self
                    .best
                    .as_ref()
                    .is_none_or(|best| alignment.rmsd() < best.alignment.rmsd() - RMSD_TIE_EPSILON);
                if improves {
                    self.best = Some(Assignment {
                        permutation: self.permutation.clone(),
                        alignment,
                    });
                }
            }
            Err(SuperpositionError::DegenerateGeometry) => self.saw_degenerate = true,
            Err(error @ SuperpositionError::MismatchedSize { .. }) => self.failure = Some(error),
        }
    }
}
