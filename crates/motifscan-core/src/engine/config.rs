use crate::core::families::SubstitutionMatrix;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub use crate::core::models::residue::ReferencePoint;

pub const DEFAULT_RMSD_CUTOFF: f64 = 2.0;
pub const DEFAULT_DISTANCE_TOLERANCE: f64 = 2.0;
pub const DEFAULT_CLUSTER_THRESHOLD: f64 = 1.0;
pub const DEFAULT_AP_DAMPING: f64 = 0.5;
pub const DEFAULT_AP_MAX_ITERATIONS: usize = 200;
pub const DEFAULT_AP_CONVERGENCE_ITERATIONS: usize = 15;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Unrecognized value '{value}' for {kind}")]
    UnknownVariant { kind: &'static str, value: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

/// Whether the search stops at the first match or enumerates all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchMode {
    #[default]
    Exhaustive,
    /// Sequential, deterministic scan that returns the first candidate under
    /// the cutoff.
    FirstMatch,
}

impl FromStr for SearchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "exhaustive" | "all" => Ok(SearchMode::Exhaustive),
            "first-match" | "first" => Ok(SearchMode::FirstMatch),
            _ => Err(ConfigError::UnknownVariant {
                kind: "search mode",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchMode::Exhaustive => "exhaustive",
            SearchMode::FirstMatch => "first-match",
        })
    }
}

/// How candidate residues are pooled before subsets are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChainScope {
    /// Every subset lies within a single chain.
    PerChain,
    /// Subsets may span all selected chains of a model.
    #[default]
    Pooled,
}

impl FromStr for ChainScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "per-chain" | "chain" => Ok(ChainScope::PerChain),
            "pooled" | "all-chains" => Ok(ChainScope::Pooled),
            _ => Err(ConfigError::UnknownVariant {
                kind: "chain scope",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ChainScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChainScope::PerChain => "per-chain",
            ChainScope::Pooled => "pooled",
        })
    }
}

impl FromStr for ReferencePoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "alpha-carbon" | "ca" => Ok(ReferencePoint::AlphaCarbon),
            "centroid" => Ok(ReferencePoint::Centroid),
            _ => Err(ConfigError::UnknownVariant {
                kind: "reference point",
                value: s.to_string(),
            }),
        }
    }
}

/// Which atoms of each residue pair enter the superposition.
///
/// Atoms always correspond by name; a selection only narrows the set of names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AtomSelection {
    /// N, CA, C, O for amino acids; P, O5', C5', C4', C3', O3' for nucleotides.
    #[default]
    Backbone,
    /// CA for amino acids, C1' for nucleotides.
    AlphaCarbon,
    /// Shared atoms outside the backbone.
    SideChain,
    /// Every atom name present in both residues.
    AllShared,
    Custom(Vec<String>),
}

impl FromStr for AtomSelection {
    type Err = ConfigError;

    /// Accepts the variant names (`backbone`, `alpha-carbon`, `side-chain`,
    /// `all-shared`) or a comma-separated list of atom names for `Custom`.
    /// A lone `ca` means [`AtomSelection::AlphaCarbon`], as for [`ReferencePoint`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "backbone" => return Ok(AtomSelection::Backbone),
            "alpha-carbon" | "ca" | "ca-only" => return Ok(AtomSelection::AlphaCarbon),
            "side-chain" | "sidechain" => return Ok(AtomSelection::SideChain),
            "all-shared" | "all" => return Ok(AtomSelection::AllShared),
            _ => {}
        }
        let names: Vec<String> = s
            .split(',')
            .map(|n| n.trim().to_ascii_uppercase())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Err(ConfigError::UnknownVariant {
                kind: "atom selection",
                value: s.to_string(),
            });
        }
        Ok(AtomSelection::Custom(names))
    }
}

impl fmt::Display for AtomSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomSelection::Backbone => f.write_str("backbone"),
            AtomSelection::AlphaCarbon => f.write_str("alpha-carbon"),
            AtomSelection::SideChain => f.write_str("side-chain"),
            AtomSelection::AllShared => f.write_str("all-shared"),
            AtomSelection::Custom(names) => f.write_str(&names.join(",")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Matches must have an RMSD strictly below this value (Å).
    pub rmsd_cutoff: f64,
    /// Allowed deviation (Å) between candidate and query inter-residue distances.
    pub distance_tolerance: f64,
    pub atoms: AtomSelection,
    pub reference_point: ReferencePoint,
    pub chain_scope: ChainScope,
    /// Restricts candidates to these chains; `None` searches every chain.
    pub chains: Option<Vec<char>>,
    pub mode: SearchMode,
    pub max_results: Option<usize>,
    /// When set, every declared exchange family must be covered by this matrix.
    pub substitution_matrix: Option<Arc<SubstitutionMatrix>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rmsd_cutoff: DEFAULT_RMSD_CUTOFF,
            distance_tolerance: DEFAULT_DISTANCE_TOLERANCE,
            atoms: AtomSelection::default(),
            reference_point: ReferencePoint::default(),
            chain_scope: ChainScope::default(),
            chains: None,
            mode: SearchMode::default(),
            max_results: None,
            substitution_matrix: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rmsd_cutoff.is_finite() || self.rmsd_cutoff <= 0.0 {
            return Err(invalid("rmsd_cutoff", format!("must be positive, got {}", self.rmsd_cutoff)));
        }
        if !self.distance_tolerance.is_finite() || self.distance_tolerance < 0.0 {
            return Err(invalid(
                "distance_tolerance",
                format!("must be non-negative, got {}", self.distance_tolerance),
            ));
        }
        validate_selection(&self.atoms)?;
        if let Some(chains) = &self.chains {
            if chains.is_empty() {
                return Err(invalid("chains", "chain filter is empty"));
            }
        }
        if self.max_results == Some(0) {
            return Err(invalid("max_results", "must be at least 1"));
        }
        Ok(())
    }
}

fn validate_selection(selection: &AtomSelection) -> Result<(), ConfigError> {
    if let AtomSelection::Custom(names) = selection {
        if names.is_empty() {
            return Err(invalid("atoms", "custom atom list is empty"));
        }
    }
    Ok(())
}

#[derive(Default)]
pub struct SearchConfigBuilder {
    rmsd_cutoff: Option<f64>,
    distance_tolerance: Option<f64>,
    atoms: Option<AtomSelection>,
    reference_point: Option<ReferencePoint>,
    chain_scope: Option<ChainScope>,
    chains: Option<Vec<char>>,
    mode: Option<SearchMode>,
    max_results: Option<usize>,
    substitution_matrix: Option<Arc<SubstitutionMatrix>>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rmsd_cutoff(mut self, cutoff: f64) -> Self {
        self.rmsd_cutoff = Some(cutoff);
        self
    }
    pub fn distance_tolerance(mut self, tolerance: f64) -> Self {
        self.distance_tolerance = Some(tolerance);
        self
    }
    pub fn atoms(mut self, selection: AtomSelection) -> Self {
        self.atoms = Some(selection);
        self
    }
    pub fn reference_point(mut self, point: ReferencePoint) -> Self {
        self.reference_point = Some(point);
        self
    }
    pub fn chain_scope(mut self, scope: ChainScope) -> Self {
        self.chain_scope = Some(scope);
        self
    }
    pub fn chains(mut self, chains: Vec<char>) -> Self {
        self.chains = Some(chains);
        self
    }
    pub fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn max_results(mut self, n: usize) -> Self {
        self.max_results = Some(n);
        self
    }
    pub fn substitution_matrix(mut self, matrix: Arc<SubstitutionMatrix>) -> Self {
        self.substitution_matrix = Some(matrix);
        self
    }

    /// Fills unset parameters with their documented defaults and validates.
    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let defaults = SearchConfig::default();
        let config = SearchConfig {
            rmsd_cutoff: self.rmsd_cutoff.unwrap_or(defaults.rmsd_cutoff),
            distance_tolerance: self.distance_tolerance.unwrap_or(defaults.distance_tolerance),
            atoms: self.atoms.unwrap_or(defaults.atoms),
            reference_point: self.reference_point.unwrap_or(defaults.reference_point),
            chain_scope: self.chain_scope.unwrap_or(defaults.chain_scope),
            chains: self.chains,
            mode: self.mode.unwrap_or(defaults.mode),
            max_results: self.max_results,
            substitution_matrix: self.substitution_matrix,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffinityPropagationConfig {
    /// Weight of the previous message in each update; must lie in `[0.5, 1)`.
    pub damping: f64,
    pub max_iterations: usize,
    /// Iterations the exemplar set must stay unchanged to count as converged.
    pub convergence_iterations: usize,
    /// Self-similarity of every point. `None` uses the median similarity.
    pub preference: Option<f64>,
}

impl Default for AffinityPropagationConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_AP_DAMPING,
            max_iterations: DEFAULT_AP_MAX_ITERATIONS,
            convergence_iterations: DEFAULT_AP_CONVERGENCE_ITERATIONS,
            preference: None,
        }
    }
}

impl AffinityPropagationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.5..1.0).contains(&self.damping) {
            return Err(invalid("damping", format!("must lie in [0.5, 1), got {}", self.damping)));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        if self.convergence_iterations == 0 || self.convergence_iterations > self.max_iterations {
            return Err(invalid(
                "convergence_iterations",
                format!("must lie in [1, {}]", self.max_iterations),
            ));
        }
        if let Some(preference) = self.preference {
            if !preference.is_finite() {
                return Err(invalid("preference", "must be finite"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClusteringMethod {
    /// Average linkage; the tree is cut at `threshold` (Å of merge distance).
    Hierarchical { threshold: f64 },
    AffinityPropagation(AffinityPropagationConfig),
}

impl Default for ClusteringMethod {
    fn default() -> Self {
        ClusteringMethod::Hierarchical {
            threshold: DEFAULT_CLUSTER_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusConfig {
    pub atoms: AtomSelection,
    pub method: ClusteringMethod,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            atoms: AtomSelection::AllShared,
            method: ClusteringMethod::default(),
        }
    }
}

impl ConsensusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_selection(&self.atoms)?;
        match &self.method {
            ClusteringMethod::Hierarchical { threshold } => {
                if !threshold.is_finite() || *threshold < 0.0 {
                    return Err(invalid("threshold", format!("must be non-negative, got {threshold}")));
                }
                Ok(())
            }
            ClusteringMethod::AffinityPropagation(ap) => ap.validate(),
        }
    }
}

pub struct ConsensusConfigBuilder {
    atoms: AtomSelection,
    method: ClusteringMethod,
}

impl Default for ConsensusConfigBuilder {
    fn default() -> Self {
        let defaults = ConsensusConfig::default();
        Self {
            atoms: defaults.atoms,
            method: defaults.method,
        }
    }
}

impl ConsensusConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atoms(mut self, selection: AtomSelection) -> Self {
        self.atoms = selection;
        self
    }
    pub fn hierarchical(mut self, threshold: f64) -> Self {
        self.method = ClusteringMethod::Hierarchical { threshold };
        self
    }
    pub fn affinity_propagation(mut self, config: AffinityPropagationConfig) -> Self {
        self.method = ClusteringMethod::AffinityPropagation(config);
        self
    }

    pub fn build(self) -> Result<ConsensusConfig, ConfigError> {
        let config = ConsensusConfig {
            atoms: self.atoms,
            method: self.method,
        };
        config.validate()?;
        Ok(config)
    }
}
