use super::atom::{AMINO_ACID_ANCHOR, Atom, NUCLEOTIDE_ANCHOR};
use crate::core::families::{ExchangeSet, Family, FamilyKind};
use crate::core::geometry::{self, Alignment, Point};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structure-scoped residue identity: chain, sequence number and insertion code.
///
/// Ordering is by chain, then number, then insertion code (no code sorts first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueKey {
    pub chain_id: char,
    pub residue_number: isize,
    pub insertion_code: Option<char>,
}

impl ResidueKey {
    pub fn new(chain_id: char, residue_number: isize) -> Self {
        Self {
            chain_id,
            residue_number,
            insertion_code: None,
        }
    }

    pub fn with_insertion_code(mut self, code: char) -> Self {
        self.insertion_code = Some(code);
        self
    }
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.residue_number)?;
        if let Some(code) = self.insertion_code {
            write!(f, "{code}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid residue key '{0}' (expected CHAIN:NUMBER[INSERTION], e.g. 'A:57' or 'A:57B')")]
pub struct ParseResidueKeyError(pub String);

impl FromStr for ResidueKey {
    type Err = ParseResidueKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseResidueKeyError(s.to_string());
        let (chain, number) = s.trim().split_once(':').ok_or_else(err)?;

        let mut chain_chars = chain.chars();
        let chain_id = match (chain_chars.next(), chain_chars.next()) {
            (Some(c), None) => c,
            _ => return Err(err()),
        };

        let number = number.trim();
        let (digits, insertion_code) = match number.chars().last() {
            Some(c) if c.is_ascii_alphabetic() => (&number[..number.len() - 1], Some(c)),
            _ => (number, None),
        };
        let residue_number = digits.parse::<isize>().map_err(|_| err())?;

        Ok(Self {
            chain_id,
            residue_number,
            insertion_code,
        })
    }
}

/// Which per-residue point stands in for the residue during candidate pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferencePoint {
    /// CA for amino acids, C1' for nucleotides; the atom centroid otherwise.
    #[default]
    AlphaCarbon,
    Centroid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    key: ResidueKey,
    name: String,
    family: Family,
    atoms: Vec<Atom>,
    atom_name_map: HashMap<String, usize>,
    exchanges: ExchangeSet,
}

impl Residue {
    /// Creates an empty residue; the family is resolved from `name`, falling
    /// back to [`Family::Unknown`].
    pub fn new(key: ResidueKey, name: &str) -> Self {
        let name = name.trim().to_ascii_uppercase();
        let family = Family::from_residue_name(&name).unwrap_or(Family::Unknown);
        Self {
            key,
            name,
            family,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
            exchanges: ExchangeSet::new(),
        }
    }

    pub fn with_family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    /// Adds an atom. Returns `false` (and keeps the existing atom) when the
    /// residue already holds an atom with the same name.
    pub fn add_atom(&mut self, atom: Atom) -> bool {
        if self.atom_name_map.contains_key(&atom.name) {
            return false;
        }
        self.atom_name_map.insert(atom.name.clone(), self.atoms.len());
        self.atoms.push(atom);
        true
    }

    pub fn key(&self) -> ResidueKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atom_name_map.get(name).map(|&i| &self.atoms[i])
    }

    pub fn atom_index(&self, name: &str) -> Option<usize> {
        self.atom_name_map.get(name).copied()
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom_name_map.contains_key(name)
    }

    pub fn exchanges(&self) -> &ExchangeSet {
        &self.exchanges
    }

    pub fn exchanges_mut(&mut self) -> &mut ExchangeSet {
        &mut self.exchanges
    }

    pub fn add_exchange(&mut self, family: Family) -> bool {
        self.exchanges.insert(family)
    }

    /// Whether `candidate` may stand in for this residue during matching.
    ///
    /// Families must be equal or the candidate's family must be one of this
    /// residue's declared exchanges. `Unknown` residues only accept residues with
    /// the same residue name.
    pub fn accepts(&self, candidate: &Residue) -> bool {
        if self.family == Family::Unknown || candidate.family == Family::Unknown {
            return self.family == candidate.family && self.name == candidate.name;
        }
        candidate.family == self.family || self.exchanges.contains(candidate.family)
    }

    pub fn centroid(&self) -> Option<Point> {
        let positions: Vec<Point> = self.atoms.iter().map(|a| a.position).collect();
        geometry::centroid(&positions)
    }

    pub fn representative_point(&self, reference: ReferencePoint) -> Option<Point> {
        match reference {
            ReferencePoint::Centroid => self.centroid(),
            ReferencePoint::AlphaCarbon => {
                let anchor = match self.family.kind() {
                    FamilyKind::AminoAcid => Some(AMINO_ACID_ANCHOR),
                    FamilyKind::Nucleotide => Some(NUCLEOTIDE_ANCHOR),
                    FamilyKind::Other => None,
                };
                anchor
                    .and_then(|name| self.atom(name))
                    .map(|atom| atom.position)
                    .or_else(|| self.centroid())
            }
        }
    }

    /// A copy of this residue with every atom moved by `alignment`.
    pub fn transformed(&self, alignment: &Alignment) -> Residue {
        let mut moved = self.clone();
        for atom in &mut moved.atoms {
            atom.position = alignment.apply(&atom.position);
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn residue_with_atoms(name: &str, atoms: &[(&str, [f64; 3])]) -> Residue {
        let mut residue = Residue::new(ResidueKey::new('A', 1), name);
        for (i, (atom_name, [x, y, z])) in atoms.iter().enumerate() {
            residue.add_atom(Atom::new(i + 1, atom_name, "", Point3::new(*x, *y, *z)));
        }
        residue
    }

    #[test]
    fn residue_key_parses_and_displays() {
        let key: ResidueKey = "A:57".parse().unwrap();
        assert_eq!(key, ResidueKey::new('A', 57));
        assert_eq!(key.to_string(), "A:57");

        let inserted: ResidueKey = "B:-3C".parse().unwrap();
        assert_eq!(inserted, ResidueKey::new('B', -3).with_insertion_code('C'));
        assert_eq!(inserted.to_string(), "B:-3C");

        assert!("57".parse::<ResidueKey>().is_err());
        assert!("AB:57".parse::<ResidueKey>().is_err());
        assert!("A:x".parse::<ResidueKey>().is_err());
    }

    #[test]
    fn residue_keys_order_by_chain_then_number_then_insertion() {
        let mut keys = vec![
            ResidueKey::new('B', 1),
            ResidueKey::new('A', 10).with_insertion_code('A'),
            ResidueKey::new('A', 10),
            ResidueKey::new('A', 2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                ResidueKey::new('A', 2),
                ResidueKey::new('A', 10),
                ResidueKey::new('A', 10).with_insertion_code('A'),
                ResidueKey::new('B', 1),
            ]
        );
    }

    #[test]
    fn new_residue_resolves_family_from_name() {
        assert_eq!(Residue::new(ResidueKey::new('A', 1), "his").family(), Family::Histidine);
        let ligand = Residue::new(ResidueKey::new('A', 2), "HEM");
        assert_eq!(ligand.family(), Family::Unknown);
        assert_eq!(ligand.name(), "HEM");
    }

    #[test]
    fn duplicate_atom_names_are_rejected() {
        let mut residue = residue_with_atoms("SER", &[("CA", [0.0, 0.0, 0.0])]);
        assert!(!residue.add_atom(Atom::new(9, "CA", "C", Point3::new(5.0, 5.0, 5.0))));
        assert_eq!(residue.atoms().len(), 1);
        assert_eq!(residue.atom("CA").unwrap().position, Point3::origin());
        assert!(residue.has_atom("CA"));
        assert!(!residue.has_atom("CB"));
    }

    #[test]
    fn accepts_requires_family_or_declared_exchange() {
        let mut query = Residue::new(ResidueKey::new('A', 1), "ASP");
        let glu = Residue::new(ResidueKey::new('B', 9), "GLU");
        let asp = Residue::new(ResidueKey::new('B', 10), "ASP");

        assert!(query.accepts(&asp));
        assert!(!query.accepts(&glu));

        query.add_exchange(Family::GlutamicAcid);
        assert!(query.accepts(&glu));
        assert!(!glu.accepts(&query));
    }

    #[test]
    fn unknown_residues_match_by_name_only() {
        let heme = Residue::new(ResidueKey::new('A', 1), "HEM");
        let other_heme = Residue::new(ResidueKey::new('B', 1), "HEM");
        let sulfate = Residue::new(ResidueKey::new('B', 2), "SO4");
        let ala = Residue::new(ResidueKey::new('B', 3), "ALA");
        assert!(heme.accepts(&other_heme));
        assert!(!heme.accepts(&sulfate));
        assert!(!heme.accepts(&ala));
        assert!(!ala.accepts(&heme));
    }

    #[test]
    fn representative_point_prefers_anchor_atom() {
        let residue = residue_with_atoms(
            "ALA",
            &[("N", [0.0, 0.0, 0.0]), ("CA", [1.5, 0.0, 0.0]), ("C", [3.0, 0.0, 0.0])],
        );
        assert_eq!(
            residue.representative_point(ReferencePoint::AlphaCarbon),
            Some(Point3::new(1.5, 0.0, 0.0))
        );
        assert_eq!(
            residue.representative_point(ReferencePoint::Centroid),
            Some(Point3::new(1.5, 0.0, 0.0))
        );

        let no_ca = residue_with_atoms("GLY", &[("N", [0.0, 0.0, 0.0]), ("C", [2.0, 2.0, 0.0])]);
        assert_eq!(
            no_ca.representative_point(ReferencePoint::AlphaCarbon),
            Some(Point3::new(1.0, 1.0, 0.0))
        );

        let nucleotide = residue_with_atoms("DA", &[("P", [0.0, 0.0, 0.0]), ("C1'", [4.0, 1.0, 2.0])]);
        assert_eq!(
            nucleotide.representative_point(ReferencePoint::AlphaCarbon),
            Some(Point3::new(4.0, 1.0, 2.0))
        );

        let empty = Residue::new(ResidueKey::new('A', 3), "ALA");
        assert!(empty.representative_point(ReferencePoint::AlphaCarbon).is_none());
    }
}
