use super::load_motif;
use crate::cli::ConsensusArgs;
use crate::config::build_consensus_config;
use crate::error::{CliError, Result};
use crate::output;
use crate::utils::progress::CliProgressHandler;
use motifscan::core::models::motif::StructuralMotif;
use motifscan::engine::progress::ProgressReporter;
use motifscan::workflows;
use motifscan::workflows::consensus::ConsensusResult;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: ConsensusArgs) -> Result<()> {
    info!("Building consensus configuration...");
    let app_config = build_consensus_config(&args)?;

    let motifs = args
        .motifs
        .iter()
        .map(|path| load_motif(path, args.residues.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Clustering {} motif(s)...", motifs.len());
    info!("Invoking the core consensus workflow...");
    let result = workflows::consensus::consensus(
        &motifs,
        &app_config.core_config,
        Some(&app_config.matrix),
        &reporter,
    )?;
    progress_handler.clear();

    print_clusters(&result, &motifs, app_config.matrix.name());

    if let Some(path) = &args.newick {
        match &result.tree {
            Some(tree) => {
                std::fs::write(path, format!("{}\n", tree.to_newick())).map_err(|e| CliError::FileWriting {
                    path: path.clone(),
                    source: e.into(),
                })?;
                println!("Cluster tree written to: {}", path.display());
            }
            None => {
                warn!("A Newick tree is only produced by hierarchical clustering; skipping {:?}.", path);
                println!("Warning: --newick ignored; affinity propagation builds no tree.");
            }
        }
    }

    if let Some(dir) = &args.consensus_dir {
        write_consensus_motifs(&result, dir)?;
    }
    Ok(())
}

fn print_clusters(result: &ConsensusResult, motifs: &[StructuralMotif], matrix_name: &str) {
    if let Some(state) = &result.affinity_state {
        println!("Affinity propagation finished: {state:?}");
    }
    println!("Found {} cluster(s):", result.clusters.len());
    for (i, cluster) in result.clusters.iter().enumerate() {
        let members: Vec<&str> = cluster.members.iter().map(|&m| motifs[m].label()).collect();
        println!(
            "  Cluster {} ({} member(s), representative '{}', mean RMSD {:.3} Å)",
            i + 1,
            cluster.members.len(),
            motifs[cluster.representative].label(),
            cluster.mean_rmsd_to_representative
        );
        println!("    members: {}", members.join(", "));
        match cluster.conservation {
            Some(score) => println!("    conservation ({matrix_name}): {score:.2}"),
            None => println!("    conservation ({matrix_name}): n/a"),
        }
    }
}

fn write_consensus_motifs(result: &ConsensusResult, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for cluster in &result.clusters {
        let path = dir.join(format!("{}.pdb", cluster.consensus.label()));
        output::write_residues(cluster.consensus.residues(), &path)?;
        info!("Wrote consensus motif to {:?}", &path);
    }
    println!(
        "{} consensus motif(s) written to: {}",
        result.clusters.len(),
        dir.display()
    );
    Ok(())
}
