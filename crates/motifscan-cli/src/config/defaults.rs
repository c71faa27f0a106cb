use motifscan::engine::config::{
    self as core_config, AtomSelection, ChainScope, ReferencePoint, SearchMode,
};

/// Values used when neither the command line, `--set` nor the config file
/// provides one.
pub struct DefaultsConfig {
    pub rmsd_cutoff: f64,
    pub distance_tolerance: f64,
    pub search_atoms: AtomSelection,
    pub reference_point: ReferencePoint,
    pub chain_scope: ChainScope,
    pub mode: SearchMode,
    pub consensus_atoms: AtomSelection,
    pub cluster_threshold: f64,
    pub damping: f64,
    pub max_iterations: usize,
    pub convergence_iterations: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            rmsd_cutoff: core_config::DEFAULT_RMSD_CUTOFF,
            distance_tolerance: core_config::DEFAULT_DISTANCE_TOLERANCE,
            search_atoms: AtomSelection::Backbone,
            reference_point: ReferencePoint::AlphaCarbon,
            chain_scope: ChainScope::Pooled,
            mode: SearchMode::Exhaustive,
            consensus_atoms: AtomSelection::AllShared,
            cluster_threshold: core_config::DEFAULT_CLUSTER_THRESHOLD,
            damping: core_config::DEFAULT_AP_DAMPING,
            max_iterations: core_config::DEFAULT_AP_MAX_ITERATIONS,
            convergence_iterations: core_config::DEFAULT_AP_CONVERGENCE_ITERATIONS,
        }
    }
}
