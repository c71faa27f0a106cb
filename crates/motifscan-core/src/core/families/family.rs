use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Broad biomolecular class of a residue family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FamilyKind {
    AminoAcid,
    Nucleotide,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Family {
    // --- Aliphatic, Nonpolar ---
    Alanine,    // ALA
    Glycine,    // GLY
    Isoleucine, // ILE
    Leucine,    // LEU
    Proline,    // PRO
    Valine,     // VAL

    // --- Aromatic ---
    Phenylalanine, // PHE
    Tryptophan,    // TRP
    Tyrosine,      // TYR

    // --- Polar, Uncharged ---
    Asparagine, // ASN
    Cysteine,   // CYS
    Glutamine,  // GLN
    Serine,     // SER
    Threonine,  // THR
    Methionine, // MET

    // --- Positively Charged (Basic) ---
    Arginine,  // ARG
    Histidine, // HIS
    Lysine,    // LYS

    // --- Negatively Charged (Acidic) ---
    AsparticAcid, // ASP
    GlutamicAcid, // GLU

    // --- Ribonucleotides ---
    Adenosine, // A
    Cytidine,  // C
    Guanosine, // G
    Uridine,   // U

    // --- Deoxyribonucleotides ---
    Deoxyadenosine, // DA
    Deoxycytidine,  // DC
    Deoxyguanosine, // DG
    Thymidine,      // DT

    /// Ligands, waters that slipped through, and modified residues without a mapping.
    Unknown,
}

static RESIDUE_NAME_MAP: phf::Map<&'static str, Family> = phf_map! {
    "ALA" => Family::Alanine,
    "GLY" => Family::Glycine,
    "ILE" => Family::Isoleucine,
    "LEU" => Family::Leucine,
    "PRO" => Family::Proline,
    "VAL" => Family::Valine,
    "PHE" => Family::Phenylalanine,
    "TRP" => Family::Tryptophan,
    "TYR" => Family::Tyrosine,
    "ASN" => Family::Asparagine,
    "CYS" => Family::Cysteine,
    "CYX" => Family::Cysteine,
    "GLN" => Family::Glutamine,
    "SER" => Family::Serine,
    "THR" => Family::Threonine,
    "MET" => Family::Methionine,
    "MSE" => Family::Methionine,
    "ARG" => Family::Arginine,
    "HIS" => Family::Histidine,
    "HSD" => Family::Histidine,
    "HSE" => Family::Histidine,
    "HSP" => Family::Histidine,
    "HID" => Family::Histidine,
    "HIE" => Family::Histidine,
    "HIP" => Family::Histidine,
    "LYS" => Family::Lysine,
    "LYN" => Family::Lysine,
    "ASP" => Family::AsparticAcid,
    "ASH" => Family::AsparticAcid,
    "GLU" => Family::GlutamicAcid,
    "GLH" => Family::GlutamicAcid,
    "A" => Family::Adenosine,
    "C" => Family::Cytidine,
    "G" => Family::Guanosine,
    "U" => Family::Uridine,
    "DA" => Family::Deoxyadenosine,
    "DC" => Family::Deoxycytidine,
    "DG" => Family::Deoxyguanosine,
    "DT" => Family::Thymidine,
    "UNK" => Family::Unknown,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unrecognized residue family code: '{0}'")]
pub struct ParseFamilyError(pub String);

impl Family {
    pub const AMINO_ACIDS: [Family; 20] = [
        Family::Alanine,
        Family::Arginine,
        Family::Asparagine,
        Family::AsparticAcid,
        Family::Cysteine,
        Family::Glutamine,
        Family::GlutamicAcid,
        Family::Glycine,
        Family::Histidine,
        Family::Isoleucine,
        Family::Leucine,
        Family::Lysine,
        Family::Methionine,
        Family::Phenylalanine,
        Family::Proline,
        Family::Serine,
        Family::Threonine,
        Family::Tryptophan,
        Family::Tyrosine,
        Family::Valine,
    ];

    pub fn kind(self) -> FamilyKind {
        match self {
            Family::Adenosine
            | Family::Cytidine
            | Family::Guanosine
            | Family::Uridine
            | Family::Deoxyadenosine
            | Family::Deoxycytidine
            | Family::Deoxyguanosine
            | Family::Thymidine => FamilyKind::Nucleotide,
            Family::Unknown => FamilyKind::Other,
            _ => FamilyKind::AminoAcid,
        }
    }

    pub fn is_amino_acid(self) -> bool {
        matches!(self.kind(), FamilyKind::AminoAcid)
    }

    pub fn is_nucleotide(self) -> bool {
        matches!(self.kind(), FamilyKind::Nucleotide)
    }

    /// Canonical PDB residue name for the family.
    pub fn three_letter_code(self) -> &'static str {
        match self {
            Family::Alanine => "ALA",
            Family::Glycine => "GLY",
            Family::Isoleucine => "ILE",
            Family::Leucine => "LEU",
            Family::Proline => "PRO",
            Family::Valine => "VAL",
            Family::Phenylalanine => "PHE",
            Family::Tryptophan => "TRP",
            Family::Tyrosine => "TYR",
            Family::Asparagine => "ASN",
            Family::Cysteine => "CYS",
            Family::Glutamine => "GLN",
            Family::Serine => "SER",
            Family::Threonine => "THR",
            Family::Methionine => "MET",
            Family::Arginine => "ARG",
            Family::Histidine => "HIS",
            Family::Lysine => "LYS",
            Family::AsparticAcid => "ASP",
            Family::GlutamicAcid => "GLU",
            Family::Adenosine => "A",
            Family::Cytidine => "C",
            Family::Guanosine => "G",
            Family::Uridine => "U",
            Family::Deoxyadenosine => "DA",
            Family::Deoxycytidine => "DC",
            Family::Deoxyguanosine => "DG",
            Family::Thymidine => "DT",
            Family::Unknown => "UNK",
        }
    }

    pub fn one_letter_code(self) -> char {
        match self {
            Family::Alanine => 'A',
            Family::Glycine => 'G',
            Family::Isoleucine => 'I',
            Family::Leucine => 'L',
            Family::Proline => 'P',
            Family::Valine => 'V',
            Family::Phenylalanine => 'F',
            Family::Tryptophan => 'W',
            Family::Tyrosine => 'Y',
            Family::Asparagine => 'N',
            Family::Cysteine => 'C',
            Family::Glutamine => 'Q',
            Family::Serine => 'S',
            Family::Threonine => 'T',
            Family::Methionine => 'M',
            Family::Arginine => 'R',
            Family::Histidine => 'H',
            Family::Lysine => 'K',
            Family::AsparticAcid => 'D',
            Family::GlutamicAcid => 'E',
            Family::Adenosine | Family::Deoxyadenosine => 'A',
            Family::Cytidine | Family::Deoxycytidine => 'C',
            Family::Guanosine | Family::Deoxyguanosine => 'G',
            Family::Uridine => 'U',
            Family::Thymidine => 'T',
            Family::Unknown => 'X',
        }
    }

    /// Resolves a residue name as found in structure files, including common
    /// protonation-state and modified-residue aliases. Unmapped names yield `None`.
    pub fn from_residue_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        RESIDUE_NAME_MAP.get(upper.as_str()).copied()
    }

    /// Resolves a one-letter amino acid code. Nucleotides share letters with
    /// amino acids and are therefore not resolved here.
    pub fn amino_acid_from_one_letter(code: char) -> Option<Self> {
        let upper = code.to_ascii_uppercase();
        Self::AMINO_ACIDS
            .iter()
            .copied()
            .find(|family| family.one_letter_code() == upper)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.three_letter_code())
    }
}

impl FromStr for Family {
    type Err = ParseFamilyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_residue_name(s).ok_or_else(|| ParseFamilyError(s.to_string()))
    }
}

impl TryFrom<String> for Family {
    type Error = ParseFamilyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Family> for String {
    fn from(family: Family) -> Self {
        family.three_letter_code().to_string()
    }
}

/// Alternate families a residue explicitly accepts as substitutes during matching.
///
/// Exchange sets are always opt-in: nothing is inferred from substitution scores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExchangeSet {
    families: BTreeSet<Family>,
}

impl ExchangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, family: Family) -> bool {
        self.families.insert(family)
    }

    pub fn remove(&mut self, family: Family) -> bool {
        self.families.remove(&family)
    }

    pub fn contains(&self, family: Family) -> bool {
        self.families.contains(&family)
    }

    pub fn clear(&mut self) {
        self.families.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Family> + '_ {
        self.families.iter().copied()
    }
}

impl FromIterator<Family> for ExchangeSet {
    fn from_iter<I: IntoIterator<Item = Family>>(iter: I) -> Self {
        Self {
            families: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_names_resolve_to_families() {
        assert_eq!(Family::from_residue_name("ALA"), Some(Family::Alanine));
        assert_eq!(Family::from_residue_name("his"), Some(Family::Histidine));
        assert_eq!(Family::from_residue_name(" DT "), Some(Family::Thymidine));
        assert_eq!(Family::from_residue_name("HOH"), None);
    }

    #[test]
    fn protonation_aliases_map_to_parent_family() {
        for alias in ["HSD", "HSE", "HSP", "HID", "HIE", "HIP"] {
            assert_eq!(Family::from_residue_name(alias), Some(Family::Histidine));
        }
        assert_eq!(Family::from_residue_name("MSE"), Some(Family::Methionine));
        assert_eq!(Family::from_residue_name("ASH"), Some(Family::AsparticAcid));
    }

    #[test]
    fn codes_round_trip_for_every_amino_acid() {
        for family in Family::AMINO_ACIDS {
            assert_eq!(family.three_letter_code().parse::<Family>(), Ok(family));
            assert_eq!(
                Family::amino_acid_from_one_letter(family.one_letter_code()),
                Some(family)
            );
        }
    }

    #[test]
    fn kind_distinguishes_amino_acids_and_nucleotides() {
        assert!(Family::Serine.is_amino_acid());
        assert!(!Family::Serine.is_nucleotide());
        assert!(Family::Guanosine.is_nucleotide());
        assert!(Family::Deoxycytidine.is_nucleotide());
        assert_eq!(Family::Unknown.kind(), FamilyKind::Other);
    }

    #[test]
    fn from_str_reports_unknown_codes() {
        let err = "XYZ".parse::<Family>().unwrap_err();
        assert_eq!(err, ParseFamilyError("XYZ".to_string()));
    }

    #[test]
    fn exchange_set_is_explicit_and_ordered() {
        let mut set = ExchangeSet::new();
        assert!(set.is_empty());
        assert!(set.insert(Family::GlutamicAcid));
        assert!(set.insert(Family::AsparticAcid));
        assert!(!set.insert(Family::GlutamicAcid));
        assert!(set.contains(Family::AsparticAcid));
        assert!(!set.contains(Family::Lysine));
        let ordered: Vec<_> = set.iter().collect();
        assert_eq!(ordered.len(), 2);
        assert!(set.remove(Family::AsparticAcid));
        assert_eq!(set.len(), 1);
    }
}
