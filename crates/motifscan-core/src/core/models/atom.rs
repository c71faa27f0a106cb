use crate::core::families::FamilyKind;
use nalgebra::Point3;
use std::str::FromStr;

pub const AMINO_ACID_BACKBONE: [&str; 4] = ["N", "CA", "C", "O"];
pub const NUCLEOTIDE_BACKBONE: [&str; 6] = ["P", "O5'", "C5'", "C4'", "C3'", "O3'"];
pub const AMINO_ACID_ANCHOR: &str = "CA";
pub const NUCLEOTIDE_ANCHOR: &str = "C1'";

/// Classification of an atom within its residue, used for atom selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    /// Main-chain atom (N, CA, C, O; or the sugar-phosphate backbone).
    Backbone,
    /// Side-chain or base atom.
    Sidechain,
    /// Anything on a residue with no known backbone (ligands, modified residues).
    #[default]
    Other,
}

impl AtomRole {
    pub fn classify(atom_name: &str, kind: FamilyKind) -> Self {
        let name = atom_name.trim();
        match kind {
            FamilyKind::AminoAcid if AMINO_ACID_BACKBONE.contains(&name) => AtomRole::Backbone,
            FamilyKind::Nucleotide if NUCLEOTIDE_BACKBONE.contains(&name) => AtomRole::Backbone,
            FamilyKind::AminoAcid | FamilyKind::Nucleotide => AtomRole::Sidechain,
            FamilyKind::Other => AtomRole::Other,
        }
    }
}

impl FromStr for AtomRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backbone" => Ok(AtomRole::Backbone),
            "sidechain" | "side-chain" | "side_chain" => Ok(AtomRole::Sidechain),
            "other" | "unknown" => Ok(AtomRole::Other),
            _ => Err(()),
        }
    }
}

/// An atom owned by a [`Residue`](super::residue::Residue). Names are unique
/// within their residue and are the only key used for atom correspondence.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub serial: usize,
    pub name: String,
    pub element: String,
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(serial: usize, name: &str, element: &str, position: Point3<f64>) -> Self {
        let element = if element.trim().is_empty() {
            infer_element(name)
        } else {
            element.trim().to_string()
        };
        Self {
            serial,
            name: name.trim().to_string(),
            element,
            position,
        }
    }
}

/// Best-effort element symbol from a PDB-style atom name: the leading alphabetic
/// character, skipping digit prefixes such as `1HB`.
pub fn infer_element(atom_name: &str) -> String {
    atom_name
        .trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}
