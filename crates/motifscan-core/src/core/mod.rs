//! # Core Module
//!
//! Stateless building blocks shared by the search engine and the public workflows.
//!
//! - **Structure Model** ([`models`]) - Atoms, residues, chains, models, structures and
//!   detached query motifs
//! - **Residue Families** ([`families`]) - Typed residue identity, exchange sets and
//!   substitution-score matrices
//! - **Geometry** ([`geometry`]) - Point helpers, a 3×3 Jacobi SVD and Kabsch superposition
//! - **File I/O** ([`io`]) - A PDB adapter behind a format-agnostic trait

pub mod families;
pub mod geometry;
pub mod io;
pub mod models;
