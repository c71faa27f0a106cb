use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `[search]` table. Enumerated values stay strings here and are parsed
/// when the configuration is built, so errors name the offending value.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSearchConfig {
    pub rmsd_cutoff: Option<f64>,
    pub distance_tolerance: Option<f64>,
    pub atoms: Option<String>,
    pub reference_point: Option<String>,
    pub chain_scope: Option<String>,
    pub chains: Option<Vec<char>>,
    pub mode: Option<String>,
    pub max_results: Option<usize>,
    pub timeout_seconds: Option<f64>,
    pub substitution_matrix: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAffinityConfig {
    pub damping: Option<f64>,
    pub max_iterations: Option<usize>,
    pub convergence_iterations: Option<usize>,
    pub preference: Option<f64>,
}

/// `[consensus]` table.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConsensusConfig {
    pub atoms: Option<String>,
    pub method: Option<String>,
    pub threshold: Option<f64>,
    pub affinity: Option<FileAffinityConfig>,
    pub substitution_matrix: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub search: Option<FileSearchConfig>,
    pub consensus: Option<FileConsensusConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
