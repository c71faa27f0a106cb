use crate::core::geometry::SuperpositionError;
use crate::core::models::residue::Residue;
use crate::engine::assignment::{AssignmentEngine, AssignmentError};
use crate::engine::candidates::CandidateGenerator;
use crate::engine::config::SearchMode;
use crate::engine::context::{ResiduePool, SearchContext};
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use crate::engine::state::{MatchResult, SearchStatistics};
use tracing::{debug, info, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Matches and counters collected while scanning pools for one query.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub matches: Vec<MatchResult>,
    pub statistics: SearchStatistics,
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct Tally {
    matches: Vec<MatchResult>,
    statistics: SearchStatistics,
    cancelled: bool,
    failure: Option<SuperpositionError>,
}

impl Tally {
    fn merge(mut self, other: Tally) -> Tally {
        self.matches.extend(other.matches);
        self.statistics += other.statistics;
        self.cancelled |= other.cancelled;
        self.failure = self.failure.or(other.failure);
        self
    }
}

enum Evaluation {
    Match(MatchResult),
    AboveCutoff,
    Incompatible,
    Degenerate,
    Cancelled,
    Failed(SuperpositionError),
}

#[instrument(skip_all, name = "motif_scan_task", fields(query = context.query.label()))]
pub fn run(context: &SearchContext, pools: &[ResiduePool]) -> Result<ScanReport, EngineError> {
    info!(pools = pools.len(), mode = %context.config.mode, "Scanning residue pools.");
    context.reporter.report(Progress::TaskStart {
        total_steps: pools.len() as u64,
    });

    let mut report = ScanReport::default();
    let mut models_seen: Option<usize> = None;
    for pool in pools {
        if models_seen != Some(pool.model_index) {
            models_seen = Some(pool.model_index);
            report.statistics.models_searched += 1;
        }
        report.statistics.pools_searched += 1;

        let tally = match context.config.mode {
            SearchMode::Exhaustive => scan_exhaustive(context, pool),
            SearchMode::FirstMatch => scan_first_match(context, pool),
        };
        debug!(
            model = pool.model_index,
            chains = ?pool.chain_ids,
            candidates = tally.statistics.candidates_generated,
            matches = tally.matches.len(),
            "Finished pool."
        );
        context.reporter.report(Progress::TaskIncrement);

        if let Some(error) = tally.failure {
            context.reporter.report(Progress::TaskFinish);
            return Err(error.into());
        }
        report.matches.extend(tally.matches);
        report.statistics += tally.statistics;
        if tally.cancelled {
            report.cancelled = true;
            break;
        }
        if context.config.mode == SearchMode::FirstMatch && !report.matches.is_empty() {
            break;
        }
    }

    report.statistics.matches_found = report.matches.len();
    context.reporter.report(Progress::TaskFinish);
    info!(
        matches = report.matches.len(),
        candidates = report.statistics.candidates_generated,
        degenerate = report.statistics.degenerate_candidates,
        cancelled = report.cancelled,
        "Scan finished."
    );
    Ok(report)
}

fn scan_exhaustive(context: &SearchContext, pool: &ResiduePool) -> Tally {
    let mut generator = CandidateGenerator::new(&pool.points, &context.profile, context.query.len(), context.cancellation);

    #[cfg(not(feature = "parallel"))]
    let mut tally = (&mut generator).fold(Tally::default(), |tally, subset| {
        record(tally, evaluate(context, pool, &subset))
    });

    #[cfg(feature = "parallel")]
    let mut tally = (&mut generator)
        .par_bridge()
        .fold(Tally::default, |tally, subset| record(tally, evaluate(context, pool, &subset)))
        .reduce(Tally::default, Tally::merge);

    tally.cancelled |= generator.was_cancelled();
    tally
}

/// Visits candidates in generator order and stops at the first match.
fn scan_first_match(context: &SearchContext, pool: &ResiduePool) -> Tally {
    let mut generator = CandidateGenerator::new(&pool.points, &context.profile, context.query.len(), context.cancellation);
    let mut tally = Tally::default();
    for subset in generator.by_ref() {
        tally = record(tally, evaluate(context, pool, &subset));
        if tally.cancelled || tally.failure.is_some() || !tally.matches.is_empty() {
            break;
        }
    }
    tally.cancelled |= generator.was_cancelled();
    tally
}

fn record(mut tally: Tally, evaluation: Evaluation) -> Tally {
    if !matches!(evaluation, Evaluation::Cancelled | Evaluation::Failed(_)) {
        tally.statistics.candidates_generated += 1;
    }
    match evaluation {
        Evaluation::Match(result) => {
            tally.statistics.candidates_superimposed += 1;
            tally.matches.push(result);
        }
        Evaluation::AboveCutoff => tally.statistics.candidates_superimposed += 1,
        Evaluation::Incompatible => tally.statistics.incompatible_candidates += 1,
        Evaluation::Degenerate => tally.statistics.degenerate_candidates += 1,
        Evaluation::Cancelled => tally.cancelled = true,
        Evaluation::Failed(error) => tally.failure = tally.failure.or(Some(error)),
    }
    tally
}

fn evaluate(context: &SearchContext, pool: &ResiduePool, subset: &[usize]) -> Evaluation {
    let candidates: Vec<&Residue> = subset.iter().map(|&i| pool.residues[i]).collect();
    let engine = AssignmentEngine::new(context.query.residues(), &context.config.atoms);

    match engine.best_assignment(&candidates, context.cancellation) {
        Ok(assignment) => {
            let rmsd = assignment.alignment.rmsd();
            if rmsd < context.config.rmsd_cutoff {
                trace!(model = pool.model_index, rmsd, "Candidate under cutoff.");
                Evaluation::Match(MatchResult {
                    rank: 0,
                    query_index: context.query_index,
                    model_index: pool.model_index,
                    residues: candidates.into_iter().cloned().collect(),
                    assignment: assignment.permutation,
                    alignment: assignment.alignment,
                })
            } else {
                Evaluation::AboveCutoff
            }
        }
        Err(AssignmentError::NoCompatibleAssignment) => Evaluation::Incompatible,
        Err(AssignmentError::Superposition(error @ SuperpositionError::MismatchedSize { .. })) => {
            Evaluation::Failed(error)
        }
        Err(AssignmentError::Superposition(SuperpositionError::DegenerateGeometry)) => {
            let keys: Vec<String> = candidates.iter().map(|r| r.key().to_string()).collect();
            debug!(model = pool.model_index, residues = ?keys, "Skipping candidate with degenerate geometry.");
            Evaluation::Degenerate
        }
        Err(AssignmentError::Cancelled) => Evaluation::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::motif::StructuralMotif;
    use crate::core::models::residue::ResidueKey;
    use crate::core::models::structure::Structure;
    use crate::engine::cancellation::CancellationToken;
    use crate::engine::config::{SearchConfig, SearchConfigBuilder};
    use crate::engine::context::build_pools;
    use crate::engine::progress::ProgressReporter;
    use crate::core::models::builder::StructureBuilder;
    use nalgebra::Point3;

    fn add_residue(builder: &mut StructureBuilder, serial: &mut usize, number: isize, name: &str, ca: [f64; 3]) {
        let [x, y, z] = ca;
        builder.start_residue(number, None, name).unwrap();
        for (atom, offset) in [("N", [-1.2, 0.5, 0.0]), ("CA", [0.0, 0.0, 0.0]), ("C", [1.1, 0.6, 0.4])] {
            *serial += 1;
            let position = Point3::new(x + offset[0], y + offset[1], z + offset[2]);
            builder.add_atom(Atom::new(*serial, atom, "", position)).unwrap();
        }
    }

    /// Two copies of a HIS/ASP/SER arrangement in chain A, the second
    /// slightly distorted, plus unrelated residues in between.
    fn target() -> Structure {
        let mut builder = StructureBuilder::new("scan");
        let mut serial = 0;
        builder.start_chain('A');
        add_residue(&mut builder, &mut serial, 1, "HIS", [0.0, 0.0, 0.0]);
        add_residue(&mut builder, &mut serial, 2, "ASP", [6.0, 0.0, 0.0]);
        add_residue(&mut builder, &mut serial, 3, "SER", [0.0, 6.0, 0.0]);
        add_residue(&mut builder, &mut serial, 4, "GLY", [30.0, 0.0, 0.0]);
        add_residue(&mut builder, &mut serial, 5, "HIS", [50.0, 0.0, 0.0]);
        add_residue(&mut builder, &mut serial, 6, "ASP", [56.0, 0.0, 0.5]);
        add_residue(&mut builder, &mut serial, 7, "SER", [50.0, 6.0, 0.0]);
        builder.build()
    }

    fn query(target: &Structure) -> StructuralMotif {
        let keys: Vec<ResidueKey> = (1..=3).map(|n| ResidueKey::new('A', n)).collect();
        StructuralMotif::from_structure("triad", target, &keys).unwrap()
    }

    fn scan(config: &SearchConfig, cancellation: Option<&CancellationToken>) -> ScanReport {
        let target = target();
        let query = query(&target);
        let reporter = ProgressReporter::new();
        let context = SearchContext::new(&query, 0, config, &reporter, cancellation).unwrap();
        let pools = build_pools(&target, &[&query], config).unwrap();
        run(&context, &pools).unwrap()
    }

    #[test]
    fn exhaustive_scan_finds_both_copies() {
        let report = scan(&SearchConfig::default(), None);
        assert!(!report.cancelled);
        assert_eq!(report.matches.len(), 2);
        assert_eq!(report.statistics.matches_found, 2);
        assert_eq!(report.statistics.models_searched, 1);
        assert!(report.statistics.candidates_generated >= 2);

        let mut rmsds: Vec<f64> = report.matches.iter().map(MatchResult::rmsd).collect();
        rmsds.sort_by(f64::total_cmp);
        assert!(rmsds[0] < 1e-9);
        assert!(rmsds[1] > 0.0 && rmsds[1] < 1.0);
    }

    #[test]
    fn first_match_stops_after_one_result() {
        let config = SearchConfigBuilder::new().mode(SearchMode::FirstMatch).build().unwrap();
        let report = scan(&config, None);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].residue_keys()[0], ResidueKey::new('A', 1));
    }

    #[test]
    fn tight_cutoff_keeps_only_the_exact_copy() {
        let config = SearchConfigBuilder::new().rmsd_cutoff(0.01).build().unwrap();
        let report = scan(&config, None);
        assert_eq!(report.matches.len(), 1);
        assert!(report.statistics.candidates_superimposed >= 2);
    }

    #[test]
    fn shape_errors_are_kept_apart_from_incompatible_candidates() {
        let target = target();
        let query = query(&target);
        let config = SearchConfig::default();
        let reporter = ProgressReporter::new();
        let context = SearchContext::new(&query, 0, &config, &reporter, None).unwrap();
        let pools = build_pools(&target, &[&query], &config).unwrap();

        let evaluation = evaluate(&context, &pools[0], &[0, 1]);
        assert!(matches!(
            evaluation,
            Evaluation::Failed(SuperpositionError::MismatchedSize {
                reference: 3,
                candidate: 2,
            })
        ));

        let tally = record(Tally::default(), evaluation).merge(Tally::default());
        assert_eq!(tally.statistics.incompatible_candidates, 0);
        assert_eq!(tally.statistics.candidates_generated, 0);
        assert!(matches!(tally.failure, Some(SuperpositionError::MismatchedSize { .. })));
    }

    #[test]
    fn cancelled_scan_is_flagged() {
        let token = CancellationToken::new();
        token.cancel();
        let report = scan(&SearchConfig::default(), Some(&token));
        assert!(report.cancelled);
        assert!(report.matches.is_empty());
    }
}
