//! # Workflows Module
//!
//! High-level entry points of the library. Each workflow validates its inputs,
//! drives the engine tasks phase by phase, reports progress and returns
//! self-contained results that hold no references into the inputs.
//!
//! - **Search** ([`search`]) - Locate one or several query motifs in a target
//!   structure and rank the occurrences by RMSD.
//! - **Consensus** ([`consensus`]) - Cluster a set of motifs by pairwise RMSD and
//!   build an averaged motif per cluster.

pub mod consensus;
pub mod search;
