pub mod consensus;
pub mod search;
pub mod superimpose;

use crate::error::{CliError, Result};
use crate::utils::parser;
use motifscan::core::io::pdb::PdbFile;
use motifscan::core::io::traits::StructureFile;
use motifscan::core::models::motif::StructuralMotif;
use motifscan::core::models::structure::Structure;
use std::path::Path;
use tracing::info;

pub(crate) fn read_structure(path: &Path) -> Result<Structure> {
    info!("Loading structure from {:?}", path);
    PdbFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// Cuts a motif out of the first model of a PDB file, labeled by the file
/// stem. Without a residue list every residue of that model is taken.
pub(crate) fn load_motif(path: &Path, residues: Option<&str>) -> Result<StructuralMotif> {
    let structure = read_structure(path)?;
    let keys = match residues {
        Some(list) => parser::parse_residue_list(list).map_err(|e| CliError::Argument(e.to_string()))?,
        None => Vec::new(),
    };
    let label = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| structure.id().to_string());

    let motif = StructuralMotif::from_structure(&label, &structure, &keys)
        .map_err(|e| CliError::Argument(format!("{}: {e}", path.display())))?;
    if motif.is_empty() {
        return Err(CliError::Argument(format!(
            "{}: no residues selected for the motif",
            path.display()
        )));
    }
    Ok(motif)
}
