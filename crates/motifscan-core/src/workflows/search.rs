use crate::core::models::motif::StructuralMotif;
use crate::core::models::structure::Structure;
use crate::engine::cancellation::CancellationToken;
use crate::engine::config::{SearchConfig, SearchMode};
use crate::engine::context::{SearchContext, build_pools};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{Completion, SearchOutcome, SearchStatistics, rank_matches};
use crate::engine::tasks;
use tracing::{info, instrument, warn};

/// Searches `target` for occurrences of `query`.
///
/// The configuration and query are validated before any candidate is
/// evaluated. Matches with RMSD strictly below the cutoff are ranked by RMSD,
/// then model index, then candidate residue keys.
///
/// A cancelled search still returns `Ok`, with the matches found so far and
/// [`Completion::Cancelled`]; see [`SearchOutcome::require_complete`].
#[instrument(skip_all, name = "search_workflow", fields(query = query.label(), target = target.id()))]
pub fn search_motif(
    query: &StructuralMotif,
    target: &Structure,
    config: &SearchConfig,
    reporter: &ProgressReporter,
    cancellation: Option<&CancellationToken>,
) -> Result<SearchOutcome, EngineError> {
    search_motifs(std::slice::from_ref(query), target, config, reporter, cancellation)
}

/// Searches `target` for several queries of equal size and merges their
/// matches into one ranking; `MatchResult::query_index` tells them apart.
///
/// Differing query sizes fail with [`EngineError::MismatchedSize`] before any
/// superposition. In first-match mode the queries are tried in order and the
/// search ends at the first match of any of them.
#[instrument(skip_all, name = "batch_search_workflow", fields(queries = queries.len()))]
pub fn search_motifs(
    queries: &[StructuralMotif],
    target: &Structure,
    config: &SearchConfig,
    reporter: &ProgressReporter,
    cancellation: Option<&CancellationToken>,
) -> Result<SearchOutcome, EngineError> {
    // === Phase 0: Validation ===
    reporter.report(Progress::PhaseStart { name: "Validation" });
    config.validate()?;

    if let Some(first) = queries.first() {
        if let Some(odd) = queries.iter().find(|q| q.len() != first.len()) {
            return Err(EngineError::MismatchedSize {
                label: odd.label().to_string(),
                expected: first.len(),
                found: odd.len(),
            });
        }
    }

    let contexts = queries
        .iter()
        .enumerate()
        .map(|(index, query)| SearchContext::new(query, index, config, reporter, cancellation))
        .collect::<Result<Vec<_>, _>>()?;

    let query_refs: Vec<&StructuralMotif> = queries.iter().collect();
    let pools = build_pools(target, &query_refs, config)?;
    reporter.report(Progress::PhaseFinish);

    if pools.iter().all(|p| p.len() < queries.first().map_or(0, StructuralMotif::len)) {
        warn!("No residue pool is large enough to hold a match.");
    }

    // === Phase 1: Scanning ===
    reporter.report(Progress::PhaseStart { name: "Motif Search" });
    let mut matches = Vec::new();
    let mut statistics = SearchStatistics::default();
    let mut completion = Completion::Complete;

    for context in &contexts {
        let report = tasks::motif_scan::run(context, &pools)?;
        matches.extend(report.matches);
        statistics.pools_searched += report.statistics.pools_searched;
        statistics.candidates_generated += report.statistics.candidates_generated;
        statistics.candidates_superimposed += report.statistics.candidates_superimposed;
        statistics.incompatible_candidates += report.statistics.incompatible_candidates;
        statistics.degenerate_candidates += report.statistics.degenerate_candidates;
        statistics.models_searched = statistics.models_searched.max(report.statistics.models_searched);

        if report.cancelled {
            completion = Completion::Cancelled;
            warn!(partial = matches.len(), "Search cancelled; returning partial results.");
            break;
        }
        if config.mode == SearchMode::FirstMatch && !matches.is_empty() {
            break;
        }
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Ranking ===
    statistics.matches_found = matches.len();
    rank_matches(&mut matches, config.max_results);
    info!(
        found = statistics.matches_found,
        returned = matches.len(),
        degenerate = statistics.degenerate_candidates,
        "Search complete."
    );

    Ok(SearchOutcome {
        matches,
        completion,
        statistics,
    })
}
