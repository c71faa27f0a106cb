use crate::core::families::SubstitutionMatrix;
use crate::core::geometry::{self, Point};
use crate::core::models::atom::Atom;
use crate::core::models::motif::StructuralMotif;
use crate::core::models::residue::Residue;
use crate::engine::clustering::{
    AffinityPropagation, AffinityState, Cluster, ClusterPartition, ClusterTree, DistanceMatrix,
};
use crate::engine::config::{AtomSelection, ClusteringMethod, ConsensusConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks;
use crate::engine::tasks::rmsd_matrix::motif_alignment;
use tracing::{debug, info, instrument};

/// One cluster of motifs together with its averaged structure.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusCluster {
    /// Ascending indices into the input motifs.
    pub members: Vec<usize>,
    pub representative: usize,
    /// Members superimposed onto the representative, atom positions averaged by
    /// name. Residue identities come from the representative.
    pub consensus: StructuralMotif,
    /// Mean RMSD of the other members to the representative (0 for singletons).
    pub mean_rmsd_to_representative: f64,
    /// Mean pairwise substitution score of member sequences, when a matrix was
    /// given and covers every member family.
    pub conservation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusResult {
    pub distances: DistanceMatrix,
    /// Present for hierarchical clustering only.
    pub tree: Option<ClusterTree>,
    pub partition: ClusterPartition,
    /// Same order as `partition`: largest first, then by smallest member.
    pub clusters: Vec<ConsensusCluster>,
    /// Final solver state for affinity propagation.
    pub affinity_state: Option<AffinityState>,
}

/// Clusters equally sized motifs by pairwise RMSD and builds one consensus
/// motif per cluster.
#[instrument(skip_all, name = "consensus_workflow", fields(motifs = motifs.len()))]
pub fn consensus(
    motifs: &[StructuralMotif],
    config: &ConsensusConfig,
    matrix: Option<&SubstitutionMatrix>,
    reporter: &ProgressReporter,
) -> Result<ConsensusResult, EngineError> {
    config.validate()?;
    if motifs.is_empty() {
        return Err(EngineError::Clustering("at least one motif is required".to_string()));
    }
    if let Some(empty) = motifs.iter().find(|m| m.is_empty()) {
        return Err(EngineError::EmptyMotif {
            label: empty.label().to_string(),
        });
    }

    // === Phase 1: Pairwise RMSD ===
    reporter.report(Progress::PhaseStart { name: "RMSD Matrix" });
    let distances = tasks::rmsd_matrix::run(motifs, &config.atoms, reporter)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Clustering ===
    reporter.report(Progress::PhaseStart { name: "Clustering" });
    let (tree, partition, affinity_state) = match &config.method {
        ClusteringMethod::Hierarchical { threshold } => {
            let tree = ClusterTree::build(&distances);
            let partition = tree.cut(*threshold, &distances);
            (Some(tree), partition, None)
        }
        ClusteringMethod::AffinityPropagation(ap_config) => {
            let mut solver = AffinityPropagation::new(&distances, *ap_config);
            let state = solver.run();
            (None, solver.partition(), Some(state))
        }
    };
    info!(clusters = partition.len(), "Clustering finished.");
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Consensus motifs ===
    reporter.report(Progress::PhaseStart { name: "Consensus" });
    let clusters = partition
        .clusters()
        .iter()
        .enumerate()
        .map(|(i, cluster)| build_cluster(motifs, cluster, i + 1, &config.atoms, matrix))
        .collect::<Result<Vec<_>, _>>()?;
    reporter.report(Progress::PhaseFinish);

    Ok(ConsensusResult {
        distances,
        tree,
        partition,
        clusters,
        affinity_state,
    })
}

fn build_cluster(
    motifs: &[StructuralMotif],
    cluster: &Cluster,
    number: usize,
    selection: &AtomSelection,
    matrix: Option<&SubstitutionMatrix>,
) -> Result<ConsensusCluster, EngineError> {
    let representative = &motifs[cluster.representative];

    let mut aligned: Vec<StructuralMotif> = Vec::with_capacity(cluster.len());
    let mut rmsds: Vec<f64> = Vec::new();
    for &member in &cluster.members {
        if member == cluster.representative {
            aligned.push(representative.clone());
            continue;
        }
        let alignment = motif_alignment(representative, &motifs[member], selection)?;
        rmsds.push(alignment.rmsd());
        aligned.push(motifs[member].transformed(&alignment));
    }

    let residues = representative
        .residues()
        .iter()
        .enumerate()
        .map(|(position, residue)| average_residue(residue, position, &aligned))
        .collect();
    let consensus = StructuralMotif::new(&format!("consensus_{number}"), residues);

    let mean_rmsd_to_representative = if rmsds.is_empty() {
        0.0
    } else {
        rmsds.iter().sum::<f64>() / rmsds.len() as f64
    };
    let conservation = matrix.and_then(|m| conservation_score(m, motifs, &cluster.members));
    debug!(
        cluster = number,
        members = cluster.len(),
        mean_rmsd_to_representative,
        "Built consensus motif."
    );

    Ok(ConsensusCluster {
        members: cluster.members.clone(),
        representative: cluster.representative,
        consensus,
        mean_rmsd_to_representative,
        conservation,
    })
}

/// Copy of `template` whose atoms sit at the mean position of the same-named
/// atom across the aligned motifs at `position`.
fn average_residue(template: &Residue, position: usize, aligned: &[StructuralMotif]) -> Residue {
    let mut averaged = Residue::new(template.key(), template.name()).with_family(template.family());
    for family in template.exchanges().iter() {
        averaged.add_exchange(family);
    }
    for atom in template.atoms() {
        let positions: Vec<Point> = aligned
            .iter()
            .filter_map(|motif| motif.residues()[position].atom(&atom.name))
            .map(|a| a.position)
            .collect();
        let mean = geometry::centroid(&positions).unwrap_or(atom.position);
        averaged.add_atom(Atom::new(atom.serial, &atom.name, &atom.element, mean));
    }
    averaged
}

fn conservation_score(matrix: &SubstitutionMatrix, motifs: &[StructuralMotif], members: &[usize]) -> Option<f64> {
    let sequences: Vec<_> = members.iter().map(|&m| motifs[m].families()).collect();
    if let [only] = sequences.as_slice() {
        return matrix.score_sequences(only, only).map(f64::from);
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in sequences.iter().enumerate() {
        for b in &sequences[i + 1..] {
            total += f64::from(matrix.score_sequences(a, b)?);
            pairs += 1;
        }
    }
    (pairs > 0).then(|| total / pairs as f64)
}
