//! # motifscan
//!
//! Structural motif search for macromolecular structures: find every occurrence of a
//! small three-dimensional arrangement of residues inside a larger structure, score
//! each occurrence by optimal rigid superposition, and cluster collections of motifs.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same strict three-layer split throughout.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Residue`,
//!   `StructuralMotif`), residue families and substitution matrices, the geometry
//!   kernel (Jacobi SVD, Kabsch superposition) and file adapters.
//!
//! - **[`engine`]: The Logic Core.** Candidate generation with k-d tree pruning, the
//!   permutation/assignment engine, RMSD matrices and the clustering algorithms
//!   (average linkage and affinity propagation), together with configuration,
//!   errors, progress reporting and cooperative cancellation.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the engine:
//!   [`workflows::search::search_motif`], [`workflows::search::search_motifs`] and
//!   [`workflows::consensus::consensus`].

pub mod core;
pub mod engine;
pub mod workflows;
