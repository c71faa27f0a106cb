//! Command-line configuration: a TOML file, `--set KEY=VALUE` overrides and
//! explicit flags, merged over built-in defaults.
//!
//! Precedence, highest first: flag, `--set`, file, default.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;

pub use builder::{build_consensus_config, build_search_config};
pub use models::{ConsensusAppConfig, SearchAppConfig};
