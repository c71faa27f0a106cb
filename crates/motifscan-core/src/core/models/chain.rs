use super::residue::{Residue, ResidueKey};
use std::collections::HashMap;

/// An ordered chain of residues. Insertion order is sequence order.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    id: char,
    residues: Vec<Residue>,
    residue_map: HashMap<(isize, Option<char>), usize>,
}

impl Chain {
    pub fn new(id: char) -> Self {
        Self {
            id,
            residues: Vec::new(),
            residue_map: HashMap::new(),
        }
    }

    pub fn id(&self) -> char {
        self.id
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn residue(&self, residue_number: isize, insertion_code: Option<char>) -> Option<&Residue> {
        self.residue_map
            .get(&(residue_number, insertion_code))
            .map(|&i| &self.residues[i])
    }

    pub fn residue_by_key(&self, key: &ResidueKey) -> Option<&Residue> {
        if key.chain_id != self.id {
            return None;
        }
        self.residue(key.residue_number, key.insertion_code)
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Returns the index of the residue with the given number and insertion
    /// code, appending a new residue named `name` when none exists yet.
    pub(crate) fn get_or_insert_residue(
        &mut self,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> usize {
        let id = self.id;
        let residues = &mut self.residues;
        *self
            .residue_map
            .entry((residue_number, insertion_code))
            .or_insert_with(|| {
                let mut key = ResidueKey::new(id, residue_number);
                key.insertion_code = insertion_code;
                residues.push(Residue::new(key, name));
                residues.len() - 1
            })
    }

    pub(crate) fn residue_at_mut(&mut self, index: usize) -> Option<&mut Residue> {
        self.residues.get_mut(index)
    }
}
