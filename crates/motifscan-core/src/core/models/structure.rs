use super::chain::Chain;
use super::residue::{Residue, ResidueKey};
use std::collections::HashMap;

/// One coordinate set of a structure (an NMR model or the single crystal model).
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    serial: usize,
    chains: Vec<Chain>,
    chain_map: HashMap<char, usize>,
}

impl Model {
    pub fn new(serial: usize) -> Self {
        Self {
            serial,
            chains: Vec::new(),
            chain_map: HashMap::new(),
        }
    }

    /// Model number as given in the source file (1 when the file has none).
    pub fn serial(&self) -> usize {
        self.serial
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn chain(&self, id: char) -> Option<&Chain> {
        self.chain_map.get(&id).map(|&i| &self.chains[i])
    }

    pub fn residue(&self, key: &ResidueKey) -> Option<&Residue> {
        self.chain(key.chain_id)?.residue_by_key(key)
    }

    pub fn residues(&self) -> impl Iterator<Item = &Residue> {
        self.chains.iter().flat_map(|c| c.residues().iter())
    }

    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(Chain::len).sum()
    }

    pub(crate) fn get_or_insert_chain(&mut self, id: char) -> usize {
        let chains = &mut self.chains;
        *self.chain_map.entry(id).or_insert_with(|| {
            chains.push(Chain::new(id));
            chains.len() - 1
        })
    }

    pub(crate) fn chain_at_mut(&mut self, index: usize) -> Option<&mut Chain> {
        self.chains.get_mut(index)
    }
}

/// A macromolecular structure: an identifier and one or more models.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    id: String,
    models: Vec<Model>,
}

impl Structure {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            models: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn first_model(&self) -> Option<&Model> {
        self.models.first()
    }

    pub fn is_empty(&self) -> bool {
        self.models.iter().all(|m| m.residue_count() == 0)
    }

    pub(crate) fn push_model(&mut self, model: Model) -> usize {
        self.models.push(model);
        self.models.len() - 1
    }

    pub(crate) fn model_at_mut(&mut self, index: usize) -> Option<&mut Model> {
        self.models.get_mut(index)
    }
}
