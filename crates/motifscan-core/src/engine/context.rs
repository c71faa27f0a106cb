use super::cancellation::CancellationToken;
use super::candidates::DistanceProfile;
use super::config::SearchConfig;
use super::correspondence::atom_pairs;
use super::error::EngineError;
use super::progress::ProgressReporter;
use crate::core::geometry::{self, Point};
use crate::core::models::motif::StructuralMotif;
use crate::core::models::residue::Residue;
use crate::core::models::structure::Structure;
use crate::engine::config::ChainScope;
use std::collections::BTreeSet;
use tracing::debug;

/// Everything a scan of one query motif needs, validated up front.
pub struct SearchContext<'a> {
    pub query: &'a StructuralMotif,
    pub query_index: usize,
    pub config: &'a SearchConfig,
    pub reporter: &'a ProgressReporter<'a>,
    pub cancellation: Option<&'a CancellationToken>,
    pub profile: DistanceProfile,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        query: &'a StructuralMotif,
        query_index: usize,
        config: &'a SearchConfig,
        reporter: &'a ProgressReporter<'a>,
        cancellation: Option<&'a CancellationToken>,
    ) -> Result<Self, EngineError> {
        let profile = validate_query(query, config)?;
        Ok(Self {
            query,
            query_index,
            config,
            reporter,
            cancellation,
            profile,
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_some_and(CancellationToken::is_cancelled)
    }
}

/// Checks a query against the configuration and returns the distance profile
/// of its representative points.
fn validate_query(query: &StructuralMotif, config: &SearchConfig) -> Result<DistanceProfile, EngineError> {
    if query.is_empty() {
        return Err(EngineError::EmptyMotif {
            label: query.label().to_string(),
        });
    }

    for residue in query.residues() {
        let own = residue.family();
        if let Some(family) = residue.exchanges().iter().find(|&f| f.kind() != own.kind()) {
            return Err(EngineError::IncompatibleExchangeKind {
                residue: residue.key(),
                own,
                family,
            });
        }
    }

    if let Some(matrix) = &config.substitution_matrix {
        for residue in query.residues() {
            if let Some(family) = residue.exchanges().iter().find(|&f| !matrix.contains(f)) {
                return Err(EngineError::UnknownExchangeFamily {
                    residue: residue.key(),
                    family,
                    matrix: matrix.name().to_string(),
                });
            }
        }
    }

    let mut selected: Vec<Point> = Vec::new();
    let mut representatives: Vec<Point> = Vec::with_capacity(query.len());
    for residue in query.residues() {
        let pairs = atom_pairs(residue, residue, &config.atoms);
        if pairs.is_empty() {
            return Err(EngineError::NoSelectedAtoms {
                residue: residue.key(),
            });
        }
        selected.extend(pairs.iter().map(|&(i, _)| residue.atoms()[i].position));
        representatives.push(
            residue
                .representative_point(config.reference_point)
                .ok_or(EngineError::NoSelectedAtoms {
                    residue: residue.key(),
                })?,
        );
    }

    if geometry::is_degenerate(&selected) {
        return Err(EngineError::DegenerateGeometry {
            label: query.label().to_string(),
        });
    }

    Ok(DistanceProfile::new(&representatives, config.distance_tolerance))
}

/// Target residues searched together: one chain or all selected chains of a
/// model, depending on the chain scope.
#[derive(Debug, Clone)]
pub struct ResiduePool<'t> {
    pub model_index: usize,
    pub chain_ids: Vec<char>,
    pub residues: Vec<&'t Residue>,
    pub points: Vec<Point>,
}

impl<'t> ResiduePool<'t> {
    fn new(model_index: usize) -> Self {
        Self {
            model_index,
            chain_ids: Vec::new(),
            residues: Vec::new(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// Splits the target into pools, keeping only residues that some query
/// residue accepts and that have a representative point.
///
/// Pools come out in model order, then chain order, which fixes the order in
/// which first-match searches visit candidates.
pub fn build_pools<'t>(
    target: &'t Structure,
    queries: &[&StructuralMotif],
    config: &SearchConfig,
) -> Result<Vec<ResiduePool<'t>>, EngineError> {
    let chain_filter: Option<BTreeSet<char>> = config.chains.as_ref().map(|c| c.iter().copied().collect());
    if let Some(filter) = &chain_filter {
        for &id in filter {
            if !target.models().iter().any(|m| m.chain(id).is_some()) {
                return Err(EngineError::ChainNotFound(id));
            }
        }
    }

    let mut pools = Vec::new();
    for (model_index, model) in target.models().iter().enumerate() {
        let mut pooled = ResiduePool::new(model_index);
        for chain in model.chains() {
            if chain_filter.as_ref().is_some_and(|f| !f.contains(&chain.id())) {
                continue;
            }
            let mut pool = match config.chain_scope {
                ChainScope::PerChain => ResiduePool::new(model_index),
                ChainScope::Pooled => std::mem::replace(&mut pooled, ResiduePool::new(model_index)),
            };
            pool.chain_ids.push(chain.id());
            for residue in chain.residues() {
                let wanted = queries
                    .iter()
                    .any(|q| q.residues().iter().any(|r| r.accepts(residue)));
                if !wanted {
                    continue;
                }
                if let Some(point) = residue.representative_point(config.reference_point) {
                    pool.residues.push(residue);
                    pool.points.push(point);
                }
            }
            match config.chain_scope {
                ChainScope::PerChain => pools.push(pool),
                ChainScope::Pooled => pooled = pool,
            }
        }
        if config.chain_scope == ChainScope::Pooled && !pooled.chain_ids.is_empty() {
            pools.push(pooled);
        }
    }

    debug!(
        pools = pools.len(),
        residues = pools.iter().map(ResiduePool::len).sum::<usize>(),
        "Built residue pools."
    );
    Ok(pools)
}
