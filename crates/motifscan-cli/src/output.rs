use crate::error::{CliError, Result};
use motifscan::core::io::pdb::PdbFile;
use motifscan::core::models::residue::Residue;
use motifscan::engine::state::{MatchResult, SearchOutcome};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// One CSV line of the ranking. Residues are listed in query order.
#[derive(Serialize)]
struct RankingRow<'a> {
    rank: usize,
    query: &'a str,
    model: usize,
    rmsd: String,
    residues: String,
    names: String,
}

impl<'a> RankingRow<'a> {
    fn new(result: &MatchResult, query: &'a str) -> Self {
        let matched: Vec<&Residue> = result.matched_residues().collect();
        Self {
            rank: result.rank,
            query,
            model: result.model_index + 1,
            rmsd: format!("{:.4}", result.rmsd()),
            residues: matched.iter().map(|r| r.key().to_string()).collect::<Vec<_>>().join(" "),
            names: matched.iter().map(|r| r.name()).collect::<Vec<_>>().join(" "),
        }
    }
}

/// Writes the ranking as CSV with a header row. `queries` maps
/// `MatchResult::query_index` to a label.
pub fn write_ranking(outcome: &SearchOutcome, queries: &[&str], writer: impl Write) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if outcome.matches.is_empty() {
        csv_writer.write_record(["rank", "query", "model", "rmsd", "residues", "names"])?;
    }
    for result in &outcome.matches {
        let query = queries.get(result.query_index).copied().unwrap_or("");
        csv_writer.serialize(RankingRow::new(result, query))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes every match, moved into the query frame, as `match_NNN.pdb` in `dir`.
pub fn write_aligned_matches(outcome: &SearchOutcome, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(outcome.matches.len());
    for result in &outcome.matches {
        let path = dir.join(format!("match_{:03}.pdb", result.rank));
        write_residues(&result.aligned_residues(), &path)?;
        info!("Wrote aligned match {} to {:?}", result.rank, &path);
        written.push(path);
    }
    Ok(written)
}

pub fn write_residues(residues: &[Residue], path: &Path) -> Result<()> {
    let to_error = |e: anyhow::Error| CliError::FileWriting {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = BufWriter::new(File::create(path)?);
    PdbFile::write_residues(residues, &mut writer).map_err(|e| to_error(e.into()))?;
    writer.flush().map_err(|e| to_error(e.into()))?;
    Ok(())
}
