use motifscan::core::families::SubstitutionMatrix;
use motifscan::engine::config as core_config;
use std::sync::Arc;
use std::time::Duration;

/// Fully resolved settings for the `search` command.
pub struct SearchAppConfig {
    pub core_config: core_config::SearchConfig,
    /// Matrix used for suggested exchanges; the same matrix validates declared
    /// exchanges when it is attached to `core_config`.
    pub matrix: Option<Arc<SubstitutionMatrix>>,
    pub timeout: Option<Duration>,
}

/// Fully resolved settings for the `consensus` command.
pub struct ConsensusAppConfig {
    pub core_config: core_config::ConsensusConfig,
    pub matrix: SubstitutionMatrix,
}
