use super::config::AtomSelection;
use crate::core::families::FamilyKind;
use crate::core::geometry::Point;
use crate::core::models::atom::{
    AMINO_ACID_ANCHOR, AMINO_ACID_BACKBONE, AtomRole, NUCLEOTIDE_ANCHOR, NUCLEOTIDE_BACKBONE,
};
use crate::core::models::residue::Residue;

/// Index pairs `(reference atom, candidate atom)` of the atoms both residues
/// share under `selection`, matched by name.
///
/// Named selections follow the reference residue's family kind. Residues of
/// kind `Other` have no backbone, so every named selection falls back to all
/// shared atoms for them.
pub fn atom_pairs(reference: &Residue, candidate: &Residue, selection: &AtomSelection) -> Vec<(usize, usize)> {
    let kind = reference.family().kind();
    let by_names = |names: &[&str]| -> Vec<(usize, usize)> {
        names
            .iter()
            .filter_map(|name| Some((reference.atom_index(name)?, candidate.atom_index(name)?)))
            .collect()
    };

    match (selection, kind) {
        (AtomSelection::Custom(names), _) => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            by_names(&names)
        }
        (_, FamilyKind::Other) | (AtomSelection::AllShared, _) => shared(reference, candidate, |_| true),
        (AtomSelection::Backbone, FamilyKind::AminoAcid) => by_names(&AMINO_ACID_BACKBONE),
        (AtomSelection::Backbone, FamilyKind::Nucleotide) => by_names(&NUCLEOTIDE_BACKBONE),
        (AtomSelection::AlphaCarbon, FamilyKind::AminoAcid) => by_names(&[AMINO_ACID_ANCHOR]),
        (AtomSelection::AlphaCarbon, FamilyKind::Nucleotide) => by_names(&[NUCLEOTIDE_ANCHOR]),
        (AtomSelection::SideChain, _) => shared(reference, candidate, |name| {
            AtomRole::classify(name, kind) == AtomRole::Sidechain
        }),
    }
}

fn shared(reference: &Residue, candidate: &Residue, keep: impl Fn(&str) -> bool) -> Vec<(usize, usize)> {
    reference
        .atoms()
        .iter()
        .enumerate()
        .filter(|(_, atom)| keep(&atom.name))
        .filter_map(|(i, atom)| Some((i, candidate.atom_index(&atom.name)?)))
        .collect()
}

/// Appends the paired positions of one residue pair to the two point lists.
pub(crate) fn extend_points(
    reference: &Residue,
    candidate: &Residue,
    pairs: &[(usize, usize)],
    reference_points: &mut Vec<Point>,
    candidate_points: &mut Vec<Point>,
) {
    for &(r, c) in pairs {
        reference_points.push(reference.atoms()[r].position);
        candidate_points.push(candidate.atoms()[c].position);
    }
}
