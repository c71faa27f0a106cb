use super::config::ConfigError;
use super::state::MatchResult;
use crate::core::families::Family;
use crate::core::geometry::SuperpositionError;
use crate::core::models::residue::ResidueKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Motif '{label}' contains no residues")]
    EmptyMotif { label: String },

    #[error("Motif '{label}' has {found} residues, expected {expected}")]
    MismatchedSize {
        label: String,
        expected: usize,
        found: usize,
    },

    #[error("Motif '{label}' has degenerate geometry under the selected atoms")]
    DegenerateGeometry { label: String },

    #[error("Motif residue {residue} selects no atoms under the current atom selection")]
    NoSelectedAtoms { residue: ResidueKey },

    #[error("Exchange family {family} on residue {residue} is not covered by substitution matrix '{matrix}'")]
    UnknownExchangeFamily {
        residue: ResidueKey,
        family: Family,
        matrix: String,
    },

    #[error("Exchange family {family} on residue {residue} is a different kind of residue than {own}")]
    IncompatibleExchangeKind {
        residue: ResidueKey,
        own: Family,
        family: Family,
    },

    #[error("Chain '{0}' from the chain filter does not exist in the target structure")]
    ChainNotFound(char),

    #[error("Motifs '{first}' and '{second}' share no atoms at residue position {position}")]
    NoAtomCorrespondence {
        first: String,
        second: String,
        position: usize,
    },

    #[error("Search was cancelled after {} match(es)", .partial.len())]
    Cancelled { partial: Vec<MatchResult> },

    #[error("Superposition failed: {0}")]
    Superposition(#[from] SuperpositionError),

    #[error("Clustering failed: {0}")]
    Clustering(String),
}
