use motifscan::core::families::{Family, SubstitutionMatrix};
use motifscan::core::io::pdb::PdbFile;
use motifscan::core::io::traits::StructureFile;
use motifscan::core::models::atom::Atom;
use motifscan::core::models::builder::StructureBuilder;
use motifscan::core::models::motif::StructuralMotif;
use motifscan::core::models::residue::{Residue, ResidueKey};
use motifscan::core::models::structure::Structure;
use motifscan::engine::cancellation::CancellationToken;
use motifscan::engine::config::{
    AffinityPropagationConfig, ConsensusConfigBuilder, SearchConfig, SearchConfigBuilder, SearchMode,
};
use motifscan::engine::error::EngineError;
use motifscan::engine::progress::{Progress, ProgressReporter};
use motifscan::engine::state::Completion;
use motifscan::engine::tasks::rmsd_matrix::motif_alignment;
use motifscan::workflows::consensus::consensus;
use motifscan::workflows::search::{search_motif, search_motifs};
use nalgebra::{Point3, Rotation3, Vector3};
use std::sync::{Arc, Mutex};

const BACKBONE_OFFSETS: [(&str, [f64; 3]); 4] = [
    ("N", [-1.2, 0.4, 0.0]),
    ("CA", [0.0, 0.0, 0.0]),
    ("C", [1.1, 0.6, 0.3]),
    ("O", [1.4, 1.7, -0.2]),
];

const TRIAD_CENTERS: [[f64; 3]; 3] = [[0.0, 0.0, 0.0], [5.5, 1.0, 0.5], [1.5, 5.0, -1.0]];

fn add_residue(
    builder: &mut StructureBuilder,
    number: isize,
    name: &str,
    center: [f64; 3],
    transform: &dyn Fn(Point3<f64>) -> Point3<f64>,
) {
    builder.start_residue(number, None, name).unwrap();
    for (serial, (atom, offset)) in BACKBONE_OFFSETS.iter().enumerate() {
        let local = Point3::new(center[0] + offset[0], center[1] + offset[1], center[2] + offset[2]);
        builder
            .add_atom(Atom::new(serial + 1, atom, "", transform(local)))
            .unwrap();
    }
}

fn moved(p: Point3<f64>) -> Point3<f64> {
    Rotation3::from_euler_angles(0.7, -0.4, 1.9) * p + Vector3::new(40.0, 5.0, -3.0)
}

/// Chain A holds the HIS/ASP/SER triad among filler residues; chain B holds a
/// rigidly moved copy whose middle residue is named `middle`.
fn target(middle: &str) -> Structure {
    let identity = |p: Point3<f64>| p;
    let mut builder = StructureBuilder::new("target");
    builder.start_chain('A');
    add_residue(&mut builder, 1, "ALA", [-8.0, 0.0, 0.0], &identity);
    add_residue(&mut builder, 2, "HIS", TRIAD_CENTERS[0], &identity);
    add_residue(&mut builder, 3, "LEU", [-8.0, 6.0, 0.0], &identity);
    add_residue(&mut builder, 4, "ASP", TRIAD_CENTERS[1], &identity);
    add_residue(&mut builder, 5, "SER", TRIAD_CENTERS[2], &identity);
    add_residue(&mut builder, 6, "GLY", [10.0, 10.0, 10.0], &identity);
    builder.start_chain('B');
    add_residue(&mut builder, 20, "HIS", TRIAD_CENTERS[0], &moved);
    add_residue(&mut builder, 21, middle, TRIAD_CENTERS[1], &moved);
    add_residue(&mut builder, 22, "SER", TRIAD_CENTERS[2], &moved);
    add_residue(&mut builder, 23, "ALA", [4.0, 4.0, 4.0], &moved);
    builder.build()
}

fn triad_keys() -> Vec<ResidueKey> {
    vec![
        ResidueKey::new('A', 2),
        ResidueKey::new('A', 4),
        ResidueKey::new('A', 5),
    ]
}

fn triad(target: &Structure) -> StructuralMotif {
    StructuralMotif::from_structure("triad", target, &triad_keys()).unwrap()
}

fn chain_ids(keys: &[ResidueKey]) -> Vec<char> {
    keys.iter().map(|k| k.chain_id).collect()
}

#[test]
fn search_ranks_self_match_before_moved_copy_after_pdb_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target.pdb");
    PdbFile::write_to_path(&target("ASP"), &path).unwrap();
    let target = PdbFile::read_from_path(&path).unwrap();
    let query = triad(&target);

    let events = Mutex::new(Vec::new());
    let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
        if let Progress::PhaseStart { name } = event {
            events.lock().unwrap().push(name);
        }
    }));
    let outcome = search_motif(&query, &target, &SearchConfig::default(), &reporter, None).unwrap();
    drop(reporter);

    assert!(outcome.is_complete());
    assert_eq!(outcome.matches.len(), 2);
    assert_eq!(outcome.statistics.matches_found, 2);
    assert_eq!(outcome.statistics.degenerate_candidates, 0);

    let first = &outcome.matches[0];
    assert_eq!(first.rank, 1);
    assert_eq!(first.residue_keys(), triad_keys());
    assert_eq!(first.assignment, vec![0, 1, 2]);
    assert!(first.rmsd() < 1e-6);

    let second = &outcome.matches[1];
    assert_eq!(second.rank, 2);
    assert_eq!(chain_ids(&second.residue_keys()), vec!['B', 'B', 'B']);
    assert!(second.rmsd() < 0.01);

    // Aligned residues land back on the query.
    let aligned = second.aligned_residues();
    for (q, a) in query.residues().iter().zip(&aligned) {
        let drift = (q.atom("CA").unwrap().position - a.atom("CA").unwrap().position).norm();
        assert!(drift < 0.01);
    }

    assert_eq!(events.into_inner().unwrap(), vec!["Validation", "Motif Search"]);
}

#[test]
fn exchange_sets_control_substituted_matches() {
    let target = target("GLU");
    let mut query = triad(&target);

    let strict = search_motif(&query, &target, &SearchConfig::default(), &ProgressReporter::new(), None).unwrap();
    assert_eq!(strict.matches.len(), 1);

    let blosum = SubstitutionMatrix::blosum62();
    let suggestions = blosum.suggest_exchanges(Family::AsparticAcid, 2);
    assert_eq!(suggestions, vec![Family::GlutamicAcid]);
    for family in suggestions {
        query.add_exchange(&ResidueKey::new('A', 4), family).unwrap();
    }

    let config = SearchConfigBuilder::new()
        .substitution_matrix(Arc::new(blosum))
        .build()
        .unwrap();
    let relaxed = search_motif(&query, &target, &config, &ProgressReporter::new(), None).unwrap();
    assert_eq!(relaxed.matches.len(), 2);
    let substituted = relaxed
        .matches
        .iter()
        .find(|m| chain_ids(&m.residue_keys()) == vec!['B', 'B', 'B'])
        .unwrap();
    assert_eq!(substituted.residues[1].family(), Family::GlutamicAcid);
    assert!(substituted.rmsd() < 1e-6);
}

#[test]
fn batch_search_rejects_mismatched_sizes_before_superposition() {
    let target = target("ASP");
    let full = triad(&target);
    let pair = StructuralMotif::new("pair", full.residues()[..2].to_vec());

    let events = Mutex::new(Vec::new());
    let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
        events.lock().unwrap().push(event);
    }));
    let err = search_motifs(&[full, pair], &target, &SearchConfig::default(), &reporter, None).unwrap_err();
    drop(reporter);

    // Validation started and nothing after it: no scan phase, no task progress.
    assert_eq!(
        events.into_inner().unwrap(),
        vec![Progress::PhaseStart { name: "Validation" }]
    );
    match err {
        EngineError::MismatchedSize {
            label,
            expected,
            found,
        } => {
            assert_eq!(label, "pair");
            assert_eq!((expected, found), (3, 2));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn batch_search_merges_rankings_across_queries() {
    let target = target("ASP");
    let first = triad(&target);
    let mut second = first.clone();
    second.set_label("triad-copy");

    let outcome = search_motifs(
        &[first, second],
        &target,
        &SearchConfig::default(),
        &ProgressReporter::new(),
        None,
    )
    .unwrap();
    assert_eq!(outcome.matches.len(), 4);
    let mut queries: Vec<usize> = outcome.matches.iter().map(|m| m.query_index).collect();
    queries.sort_unstable();
    assert_eq!(queries, vec![0, 0, 1, 1]);
    let ranks: Vec<usize> = outcome.matches.iter().map(|m| m.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
}

#[test]
fn first_match_mode_and_result_limits() {
    let target = target("ASP");
    let query = triad(&target);

    let first_match = SearchConfigBuilder::new().mode(SearchMode::FirstMatch).build().unwrap();
    let outcome = search_motif(&query, &target, &first_match, &ProgressReporter::new(), None).unwrap();
    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].residue_keys(), triad_keys());

    let limited = SearchConfigBuilder::new().max_results(1).build().unwrap();
    let outcome = search_motif(&query, &target, &limited, &ProgressReporter::new(), None).unwrap();
    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.statistics.matches_found, 2);
}

#[test]
fn matches_report_the_model_they_came_from() {
    let identity = |p: Point3<f64>| p;
    let mut builder = StructureBuilder::new("ensemble");
    builder.start_model(1).start_chain('A');
    add_residue(&mut builder, 2, "HIS", TRIAD_CENTERS[0], &identity);
    add_residue(&mut builder, 4, "ASP", TRIAD_CENTERS[1], &identity);
    add_residue(&mut builder, 5, "SER", TRIAD_CENTERS[2], &identity);
    builder.start_model(2).start_chain('A');
    add_residue(&mut builder, 2, "HIS", TRIAD_CENTERS[0], &moved);
    add_residue(&mut builder, 4, "ASP", TRIAD_CENTERS[1], &moved);
    add_residue(&mut builder, 5, "SER", TRIAD_CENTERS[2], &moved);
    let ensemble = builder.build();

    let query = triad(&ensemble);
    let outcome = search_motif(&query, &ensemble, &SearchConfig::default(), &ProgressReporter::new(), None).unwrap();
    let mut models: Vec<usize> = outcome.matches.iter().map(|m| m.model_index).collect();
    models.sort_unstable();
    assert_eq!(models, vec![0, 1]);
    assert_eq!(outcome.statistics.models_searched, 2);
}

#[test]
fn cancelled_search_returns_partial_outcome() {
    let target = target("ASP");
    let query = triad(&target);
    let token = CancellationToken::new();
    token.cancel();

    let outcome = search_motif(
        &query,
        &target,
        &SearchConfig::default(),
        &ProgressReporter::new(),
        Some(&token),
    )
    .unwrap();
    assert_eq!(outcome.completion, Completion::Cancelled);
    assert!(matches!(
        outcome.require_complete(),
        Err(EngineError::Cancelled { .. })
    ));
}

#[test]
fn unknown_filter_chain_is_an_error() {
    let target = target("ASP");
    let query = triad(&target);
    let config = SearchConfigBuilder::new().chains(vec!['Q']).build().unwrap();
    let err = search_motif(&query, &target, &config, &ProgressReporter::new(), None).unwrap_err();
    assert!(matches!(err, EngineError::ChainNotFound('Q')));
}

/// Nine motifs in three geometric groups. Members of a group differ by a small
/// CA displacement and an arbitrary rigid motion.
fn grouped_motifs() -> Vec<StructuralMotif> {
    let names = ["HIS", "ASP", "SER"];
    let mut motifs = Vec::new();
    for group in 0..3 {
        for member in 0..3 {
            let mut centers = TRIAD_CENTERS;
            match group {
                1 => centers[2][0] += 6.0,
                2 => centers[1][2] += 6.0,
                _ => {}
            }
            let (g, m) = (group as f64, member as f64);
            let rotation = Rotation3::from_euler_angles(0.3 * m + g, 0.2 * g - 0.1 * m, 0.5 * m);
            let shift = Vector3::new(10.0 * g, -3.0 * m, 2.0);

            let residues = centers
                .iter()
                .zip(names)
                .enumerate()
                .map(|(i, (center, name))| {
                    let mut residue = Residue::new(ResidueKey::new('A', i as isize + 1), name);
                    for (serial, (atom, offset)) in BACKBONE_OFFSETS.iter().enumerate() {
                        let mut local =
                            Point3::new(center[0] + offset[0], center[1] + offset[1], center[2] + offset[2]);
                        if i == 0 && *atom == "CA" {
                            local.x += 0.1 * m;
                        }
                        residue.add_atom(Atom::new(serial + 1, atom, "", rotation * local + shift));
                    }
                    residue
                })
                .collect();
            motifs.push(StructuralMotif::new(&format!("g{group}m{member}"), residues));
        }
    }
    motifs
}

#[test]
fn hierarchical_consensus_recovers_three_groups_deterministically() {
    let motifs = grouped_motifs();
    let config = ConsensusConfigBuilder::new().hierarchical(1.0).build().unwrap();
    let blosum = SubstitutionMatrix::blosum62();

    let result = consensus(&motifs, &config, Some(&blosum), &ProgressReporter::new()).unwrap();
    let again = consensus(&motifs, &config, Some(&blosum), &ProgressReporter::new()).unwrap();
    assert_eq!(result, again);

    let groups: Vec<(Vec<usize>, usize)> = result
        .clusters
        .iter()
        .map(|c| (c.members.clone(), c.representative))
        .collect();
    assert_eq!(
        groups,
        vec![(vec![0, 1, 2], 1), (vec![3, 4, 5], 4), (vec![6, 7, 8], 7)]
    );

    for cluster in &result.clusters {
        assert!(cluster.mean_rmsd_to_representative < 0.1);
        // HIS-HIS 8, ASP-ASP 6, SER-SER 4.
        assert_eq!(cluster.conservation, Some(18.0));
        let representative = &motifs[cluster.representative];
        let fit = motif_alignment(representative, &cluster.consensus, &config.atoms).unwrap();
        assert!(fit.rmsd() < 0.1);
    }
    assert_eq!(result.clusters[0].consensus.label(), "consensus_1");

    let tree = result.tree.as_ref().unwrap();
    assert_eq!(tree.leaf_count(), 9);
    let newick = tree.to_newick();
    assert!(newick.ends_with(';'));
    for motif in &motifs {
        assert!(newick.contains(motif.label()));
    }
    assert!(result.affinity_state.is_none());
    assert!(result.distances.get(0, 3) > 1.5);
}

#[test]
fn affinity_propagation_consensus_matches_hierarchical_groups() {
    let motifs = grouped_motifs();
    let config = ConsensusConfigBuilder::new()
        .affinity_propagation(AffinityPropagationConfig::default())
        .build()
        .unwrap();

    let result = consensus(&motifs, &config, None, &ProgressReporter::new()).unwrap();
    assert!(result.tree.is_none());
    assert!(matches!(
        result.affinity_state,
        Some(motifscan::engine::clustering::AffinityState::Converged { .. })
    ));
    let members: Vec<Vec<usize>> = result.clusters.iter().map(|c| c.members.clone()).collect();
    assert_eq!(members, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]);
    assert!(result.clusters.iter().all(|c| c.conservation.is_none()));
}

#[test]
fn consensus_rejects_mixed_sizes_and_empty_input() {
    let mut motifs = grouped_motifs();
    motifs.push(StructuralMotif::new("short", motifs[0].residues()[..2].to_vec()));
    let config = ConsensusConfigBuilder::new().build().unwrap();
    assert!(matches!(
        consensus(&motifs, &config, None, &ProgressReporter::new()),
        Err(EngineError::MismatchedSize { .. })
    ));
    assert!(matches!(
        consensus(&[], &config, None, &ProgressReporter::new()),
        Err(EngineError::Clustering(_))
    ));
}
