use super::atom::Atom;
use super::structure::{Model, Structure};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("Cannot start a residue before starting a chain")]
    NoChain,
    #[error("Cannot add an atom before starting a residue")]
    NoResidue,
}

/// Incremental construction of a [`Structure`] in file order.
///
/// Chains and residues are looked up by identifier, so re-opening a chain or
/// residue that already exists in the current model appends to it.
pub struct StructureBuilder {
    structure: Structure,
    current_model: Option<usize>,
    current_chain: Option<usize>,
    current_residue: Option<usize>,
}

impl StructureBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            structure: Structure::new(id),
            current_model: None,
            current_chain: None,
            current_residue: None,
        }
    }

    pub fn start_model(&mut self, serial: usize) -> &mut Self {
        let index = self.structure.push_model(Model::new(serial));
        self.current_model = Some(index);
        self.current_chain = None;
        self.current_residue = None;
        self
    }

    /// Starts (or re-opens) a chain. A first model is created implicitly when
    /// none has been started.
    pub fn start_chain(&mut self, id: char) -> &mut Self {
        let model_index = match self.current_model {
            Some(index) => index,
            None => {
                self.start_model(1);
                self.structure.models().len() - 1
            }
        };
        if let Some(model) = self.structure.model_at_mut(model_index) {
            self.current_chain = Some(model.get_or_insert_chain(id));
        }
        self.current_residue = None;
        self
    }

    pub fn start_residue(
        &mut self,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> Result<&mut Self, BuildError> {
        let (Some(model), Some(chain)) = (self.current_model, self.current_chain) else {
            return Err(BuildError::NoChain);
        };
        let chain = self
            .structure
            .model_at_mut(model)
            .and_then(|m| m.chain_at_mut(chain))
            .ok_or(BuildError::NoChain)?;
        self.current_residue = Some(chain.get_or_insert_residue(residue_number, insertion_code, name));
        Ok(self)
    }

    /// Adds an atom to the current residue. Returns `Ok(false)` when the residue
    /// already has an atom of that name; the first occurrence wins.
    pub fn add_atom(&mut self, atom: Atom) -> Result<bool, BuildError> {
        let (Some(model), Some(chain), Some(residue)) =
            (self.current_model, self.current_chain, self.current_residue)
        else {
            return Err(BuildError::NoResidue);
        };
        let residue = self
            .structure
            .model_at_mut(model)
            .and_then(|m| m.chain_at_mut(chain))
            .and_then(|c| c.residue_at_mut(residue))
            .ok_or(BuildError::NoResidue)?;
        Ok(residue.add_atom(atom))
    }

    pub fn build(self) -> Structure {
        self.structure
    }
}
