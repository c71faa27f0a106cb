//! # Structure Models
//!
//! Plain owned data describing a macromolecular structure, organized as a strict
//! tree: a [`structure::Structure`] owns its models, a model owns its chains, a
//! chain owns its residues and a residue owns its atoms. Lookups go through
//! identifiers (chain id, [`residue::ResidueKey`], atom name) rather than
//! back-pointers, so any residue can be cloned out as a self-contained value.
//!
//! - [`atom`] - Atoms and backbone/side-chain classification
//! - [`residue`] - Residues, residue keys and representative points
//! - [`chain`] - Ordered residue containers
//! - [`structure`] - Models and structures
//! - [`motif`] - Detached residue lists used as search queries
//! - [`builder`] - Incremental construction in file order

pub mod atom;
pub mod builder;
pub mod chain;
pub mod motif;
pub mod residue;
pub mod structure;
