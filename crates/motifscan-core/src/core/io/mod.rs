//! File-format adapters. Only the PDB format is provided; it sits behind the
//! [`traits::StructureFile`] trait so the rest of the crate stays format-agnostic.

pub mod pdb;
pub mod traits;
