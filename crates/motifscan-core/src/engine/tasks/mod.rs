//! Computational units behind the public workflows.
//!
//! Each task exposes a `run` entry point: [`motif_scan`] evaluates candidate
//! subsets of residue pools against one query motif, and [`rmsd_matrix`]
//! computes all pairwise motif RMSDs for clustering.

pub mod motif_scan;
pub mod rmsd_matrix;
