use super::residue::{Residue, ResidueKey};
use super::structure::{Model, Structure};
use crate::core::families::Family;
use crate::core::geometry::Alignment;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MotifError {
    #[error("Structure '{0}' has no models")]
    NoModel(String),
    #[error("Residue {0} not found in structure")]
    ResidueNotFound(ResidueKey),
    #[error("Residue {0} is not part of the motif")]
    NotInMotif(ResidueKey),
    #[error("Residue {0} is listed more than once")]
    DuplicateResidue(ResidueKey),
}

/// An ordered, detached list of residues to search for.
///
/// Residues are value copies; the motif never refers back into the structure
/// it was cut from. The label names the motif in cluster trees and reports.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralMotif {
    label: String,
    residues: Vec<Residue>,
}

impl StructuralMotif {
    pub fn new(label: &str, residues: Vec<Residue>) -> Self {
        Self {
            label: label.to_string(),
            residues,
        }
    }

    /// Copies the residues named by `keys` out of `model`, in the given order.
    pub fn from_model(label: &str, model: &Model, keys: &[ResidueKey]) -> Result<Self, MotifError> {
        let mut residues: Vec<Residue> = Vec::with_capacity(keys.len());
        for key in keys {
            if residues.iter().any(|r| r.key() == *key) {
                return Err(MotifError::DuplicateResidue(*key));
            }
            let residue = model
                .residue(key)
                .ok_or(MotifError::ResidueNotFound(*key))?;
            residues.push(residue.clone());
        }
        Ok(Self::new(label, residues))
    }

    /// Like [`StructuralMotif::from_model`] on the first model. An empty `keys`
    /// slice takes every residue of that model.
    pub fn from_structure(
        label: &str,
        structure: &Structure,
        keys: &[ResidueKey],
    ) -> Result<Self, MotifError> {
        let model = structure
            .first_model()
            .ok_or_else(|| MotifError::NoModel(structure.id().to_string()))?;
        if keys.is_empty() {
            return Ok(Self::new(label, model.residues().cloned().collect()));
        }
        Self::from_model(label, model, keys)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn families(&self) -> Vec<Family> {
        self.residues.iter().map(Residue::family).collect()
    }

    pub fn keys(&self) -> Vec<ResidueKey> {
        self.residues.iter().map(Residue::key).collect()
    }

    /// Declares `family` as an accepted substitute for the motif residue `key`.
    pub fn add_exchange(&mut self, key: &ResidueKey, family: Family) -> Result<(), MotifError> {
        let residue = self
            .residues
            .iter_mut()
            .find(|r| r.key() == *key)
            .ok_or(MotifError::NotInMotif(*key))?;
        residue.add_exchange(family);
        Ok(())
    }

    pub fn clear_exchanges(&mut self) {
        for residue in &mut self.residues {
            residue.exchanges_mut().clear();
        }
    }

    pub fn transformed(&self, alignment: &Alignment) -> StructuralMotif {
        Self {
            label: self.label.clone(),
            residues: self.residues.iter().map(|r| r.transformed(alignment)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::builder::StructureBuilder;
    use nalgebra::Point3;

    fn small_structure() -> Structure {
        let mut builder = StructureBuilder::new("small");
        builder.start_chain('A');
        for (number, name) in [(10, "HIS"), (20, "ASP"), (30, "SER")] {
            builder.start_residue(number, None, name).unwrap();
            builder
                .add_atom(Atom::new(number as usize, "CA", "C", Point3::new(number as f64, 0.0, 0.0)))
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn from_structure_copies_residues_in_requested_order() {
        let structure = small_structure();
        let keys = [ResidueKey::new('A', 30), ResidueKey::new('A', 10)];
        let motif = StructuralMotif::from_structure("triad", &structure, &keys).unwrap();
        assert_eq!(motif.label(), "triad");
        assert_eq!(motif.keys(), keys.to_vec());
        assert_eq!(motif.families(), vec![Family::Serine, Family::Histidine]);
    }

    #[test]
    fn empty_key_list_takes_all_residues() {
        let motif = StructuralMotif::from_structure("all", &small_structure(), &[]).unwrap();
        assert_eq!(motif.len(), 3);
    }

    #[test]
    fn missing_and_duplicate_residues_are_reported() {
        let structure = small_structure();
        let missing = StructuralMotif::from_structure("m", &structure, &[ResidueKey::new('B', 10)]);
        assert_eq!(missing, Err(MotifError::ResidueNotFound(ResidueKey::new('B', 10))));

        let key = ResidueKey::new('A', 10);
        let duplicate = StructuralMotif::from_structure("d", &structure, &[key, key]);
        assert_eq!(duplicate, Err(MotifError::DuplicateResidue(key)));

        let empty = Structure::new("empty");
        assert_eq!(
            StructuralMotif::from_structure("e", &empty, &[key]),
            Err(MotifError::NoModel("empty".to_string()))
        );
    }

    #[test]
    fn exchanges_are_declared_per_residue() {
        let mut motif = StructuralMotif::from_structure("x", &small_structure(), &[]).unwrap();
        motif
            .add_exchange(&ResidueKey::new('A', 20), Family::GlutamicAcid)
            .unwrap();
        assert!(motif.residues()[1].exchanges().contains(Family::GlutamicAcid));
        assert!(motif.residues()[0].exchanges().is_empty());
        assert_eq!(
            motif.add_exchange(&ResidueKey::new('A', 99), Family::Alanine),
            Err(MotifError::NotInMotif(ResidueKey::new('A', 99)))
        );
        motif.clear_exchanges();
        assert!(motif.residues()[1].exchanges().is_empty());
    }
}
