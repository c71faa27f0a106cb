use super::{load_motif, read_structure};
use crate::cli::SearchArgs;
use crate::config::build_search_config;
use crate::error::{CliError, Result};
use crate::output;
use crate::utils::parser;
use crate::utils::progress::CliProgressHandler;
use motifscan::core::families::SubstitutionMatrix;
use motifscan::core::models::motif::StructuralMotif;
use motifscan::engine::cancellation::CancellationToken;
use motifscan::engine::progress::ProgressReporter;
use motifscan::workflows;
use std::fs::File;
use std::io::BufWriter;
use tracing::{info, warn};

pub fn run(args: SearchArgs) -> Result<()> {
    info!("Building search configuration...");
    let app_config = build_search_config(&args)?;

    let mut query = load_motif(&args.motif, args.residues.as_deref())?;
    declare_exchanges(&mut query, &args.exchanges)?;
    if let Some(min_score) = args.suggest_exchanges {
        let matrix = app_config.matrix.as_deref().ok_or_else(|| {
            CliError::Config("--suggest-exchanges requires a substitution matrix".to_string())
        })?;
        suggest_exchanges(&mut query, matrix, min_score)?;
    }
    let target = read_structure(&args.target)?;

    let cancellation = app_config.timeout.map(|timeout| {
        info!("Search will stop after {:.1}s.", timeout.as_secs_f64());
        CancellationToken::with_timeout(timeout)
    });

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Searching '{}' for motif '{}' ({} residues, {} mode)...",
        target.id(),
        query.label(),
        query.len(),
        app_config.core_config.mode
    );
    info!("Invoking the core search workflow...");
    let outcome = workflows::search::search_motif(
        &query,
        &target,
        &app_config.core_config,
        &reporter,
        cancellation.as_ref(),
    )?;
    progress_handler.clear();

    let stats = &outcome.statistics;
    info!(
        "Workflow finished: {} candidate(s) superimposed, {} match(es) found.",
        stats.candidates_superimposed, stats.matches_found
    );
    if !outcome.is_complete() {
        warn!("Search stopped before completion; the ranking is partial.");
        println!("Warning: the search timed out; results are partial.");
    }
    if stats.degenerate_candidates > 0 {
        println!(
            "Note: {} candidate(s) with degenerate geometry were skipped.",
            stats.degenerate_candidates
        );
    }

    let labels = [query.label()];
    match &args.output {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            output::write_ranking(&outcome, &labels, file)?;
            println!(
                "Ranking of {} match(es) written to: {}",
                outcome.matches.len(),
                path.display()
            );
        }
        None => output::write_ranking(&outcome, &labels, std::io::stdout().lock())?,
    }

    if let Some(dir) = &args.aligned_dir {
        let written = output::write_aligned_matches(&outcome, dir)?;
        println!(
            "{} aligned match(es) written to: {}",
            written.len(),
            dir.display()
        );
    }

    if outcome.matches.is_empty() {
        println!("No match below {:.2} Å RMSD was found.", app_config.core_config.rmsd_cutoff);
    }
    Ok(())
}

fn declare_exchanges(query: &mut StructuralMotif, exchanges: &[String]) -> Result<()> {
    for spec in exchanges {
        let (key, families) = parser::parse_exchange(spec).map_err(|e| CliError::Argument(e.to_string()))?;
        for family in families {
            query
                .add_exchange(&key, family)
                .map_err(|e| CliError::Argument(format!("--exchange {spec}: {e}")))?;
        }
        info!("Residue {} also accepts: {}", key, spec.split_once('=').map_or("", |(_, f)| f));
    }
    Ok(())
}

/// Declares, for every query residue, each family scoring at least
/// `min_score` against it.
fn suggest_exchanges(query: &mut StructuralMotif, matrix: &SubstitutionMatrix, min_score: i32) -> Result<()> {
    let suggestions: Vec<_> = query
        .residues()
        .iter()
        .map(|r| (r.key(), matrix.suggest_exchanges(r.family(), min_score)))
        .collect();
    for (key, families) in suggestions {
        if families.is_empty() {
            continue;
        }
        let names: Vec<String> = families.iter().map(ToString::to_string).collect();
        info!("Suggested exchanges for {}: {}", key, names.join(","));
        for family in families {
            query
                .add_exchange(&key, family)
                .map_err(|e| CliError::Argument(e.to_string()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use motifscan::core::families::Family;
    use motifscan::core::geometry::Point;
    use motifscan::core::models::atom::Atom;
    use motifscan::core::models::residue::{Residue, ResidueKey};

    fn query() -> StructuralMotif {
        let residues = [("HIS", 57), ("ASP", 102)]
            .iter()
            .map(|&(name, number)| {
                let mut residue = Residue::new(ResidueKey::new('A', number), name);
                residue.add_atom(Atom::new(1, "CA", "C", Point::new(number as f64, 0.0, 0.0)));
                residue
            })
            .collect();
        StructuralMotif::new("triad", residues)
    }

    #[test]
    fn declared_exchanges_reach_the_residue() {
        let mut motif = query();
        declare_exchanges(&mut motif, &["A:102=GLU,ASN".to_string()]).unwrap();
        let asp = &motif.residues()[1];
        assert!(asp.exchanges().contains(Family::GlutamicAcid));
        assert!(asp.exchanges().contains(Family::Asparagine));
        assert!(!motif.residues()[0].exchanges().contains(Family::GlutamicAcid));
    }

    #[test]
    fn exchanges_on_unknown_residues_are_rejected() {
        let mut motif = query();
        let err = declare_exchanges(&mut motif, &["B:1=GLU".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }

    #[test]
    fn suggestions_come_from_the_matrix() {
        let mut motif = query();
        suggest_exchanges(&mut motif, &SubstitutionMatrix::blosum62(), 2).unwrap();
        let asp = &motif.residues()[1];
        assert!(asp.exchanges().contains(Family::GlutamicAcid));
        assert!(!asp.exchanges().contains(Family::Asparagine));
    }
}
