//! # Engine Module
//!
//! The search and clustering machinery that sits between the stateless models in
//! [`crate::core`] and the public entry points in [`crate::workflows`].
//!
//! ## Overview
//!
//! A motif search validates its query into a [`context::SearchContext`], splits the
//! target into residue pools, lazily enumerates geometrically plausible candidate
//! subsets ([`candidates`]) and, for each subset, finds the family-compatible residue
//! correspondence with the lowest RMSD ([`assignment`]). Consensus analysis computes a
//! pairwise RMSD matrix and clusters it ([`clustering`]).
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Search and consensus parameters with validated builders
//! - **State** ([`state`]) - Match results, ranking and search statistics
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Cancellation** ([`cancellation`]) - Cooperative stop flag with optional deadline
//! - **Error Handling** ([`error`]) - Engine-level error taxonomy
//! - **Tasks** ([`tasks`]) - Parallel candidate scanning and RMSD matrix computation
//!
//! ## Concurrency
//!
//! With the `parallel` feature (on by default), candidate subsets and matrix pairs are
//! evaluated on the rayon thread pool. Results are sorted afterwards, so output never
//! depends on scheduling.

pub mod assignment;
pub mod cancellation;
pub mod candidates;
pub mod clustering;
pub mod config;
pub mod context;
pub mod correspondence;
pub mod error;
pub mod progress;
pub mod state;
pub mod tasks;
