//! Residue identity: the closed [`family::Family`] enum, opt-in exchange sets, and
//! labeled substitution-score matrices.

pub mod family;
pub mod substitution;

pub use family::{ExchangeSet, Family, FamilyKind, ParseFamilyError};
pub use substitution::{SubstitutionLoadError, SubstitutionMatrix};
