use super::error::EngineError;
use crate::core::geometry::Alignment;
use crate::core::models::residue::{Residue, ResidueKey};
use std::cmp::Ordering;
use std::ops::AddAssign;

/// One occurrence of a query motif in the target.
///
/// Everything is held by value; a result stays valid after the target
/// structure is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// 1-based position in the final ranking.
    pub rank: usize,
    /// Index of the query motif (always 0 for single-motif searches).
    pub query_index: usize,
    /// Index into the target's models.
    pub model_index: usize,
    /// Candidate residues in target order.
    pub residues: Vec<Residue>,
    /// `assignment[i]` is the position in `residues` matched to query residue `i`.
    pub assignment: Vec<usize>,
    /// Superposition of the candidate atoms onto the query atoms.
    pub alignment: Alignment,
}

impl MatchResult {
    pub fn rmsd(&self) -> f64 {
        self.alignment.rmsd()
    }

    pub fn residue_keys(&self) -> Vec<ResidueKey> {
        self.residues.iter().map(Residue::key).collect()
    }

    /// Candidate residues reordered to line up with the query residues.
    pub fn matched_residues(&self) -> impl Iterator<Item = &Residue> {
        self.assignment.iter().map(|&j| &self.residues[j])
    }

    /// Candidate residues moved into the query frame.
    pub fn aligned_residues(&self) -> Vec<Residue> {
        self.matched_residues()
            .map(|r| r.transformed(&self.alignment))
            .collect()
    }

    pub(crate) fn ranking_order(a: &MatchResult, b: &MatchResult) -> Ordering {
        a.rmsd()
            .total_cmp(&b.rmsd())
            .then(a.model_index.cmp(&b.model_index))
            .then_with(|| a.residue_keys().cmp(&b.residue_keys()))
            .then(a.query_index.cmp(&b.query_index))
    }
}

/// Sorts matches into ranking order, truncates and assigns 1-based ranks.
pub(crate) fn rank_matches(matches: &mut Vec<MatchResult>, max_results: Option<usize>) {
    matches.sort_by(MatchResult::ranking_order);
    if let Some(limit) = max_results {
        matches.truncate(limit);
    }
    for (i, m) in matches.iter_mut().enumerate() {
        m.rank = i + 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completion {
    #[default]
    Complete,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStatistics {
    pub models_searched: usize,
    pub pools_searched: usize,
    /// Subsets that passed the distance filter.
    pub candidates_generated: usize,
    /// Candidates with at least one superimposed permutation.
    pub candidates_superimposed: usize,
    /// Candidates with no family-compatible permutation.
    pub incompatible_candidates: usize,
    /// Candidates skipped because every compatible permutation was degenerate.
    pub degenerate_candidates: usize,
    /// Matches under the cutoff before `max_results` truncation.
    pub matches_found: usize,
}

impl AddAssign for SearchStatistics {
    fn add_assign(&mut self, other: Self) {
        self.models_searched += other.models_searched;
        self.pools_searched += other.pools_searched;
        self.candidates_generated += other.candidates_generated;
        self.candidates_superimposed += other.candidates_superimposed;
        self.incompatible_candidates += other.incompatible_candidates;
        self.degenerate_candidates += other.degenerate_candidates;
        self.matches_found += other.matches_found;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub matches: Vec<MatchResult>,
    pub completion: Completion,
    pub statistics: SearchStatistics,
}

impl SearchOutcome {
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }

    /// Fails with [`EngineError::Cancelled`], carrying the partial matches,
    /// unless the search ran to completion.
    pub fn require_complete(self) -> Result<Self, EngineError> {
        match self.completion {
            Completion::Complete => Ok(self),
            Completion::Cancelled => Err(EngineError::Cancelled {
                partial: self.matches,
            }),
        }
    }
}
