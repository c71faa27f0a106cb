use clap::{Args, Parser, Subcommand, ValueEnum};
use motifscan::engine::config::{AtomSelection, ChainScope, ReferencePoint, SearchMode};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "motifscan - Find and cluster small three-dimensional residue motifs in macromolecular structures.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a target structure for occurrences of a residue motif.
    Search(SearchArgs),
    /// Cluster equally sized motifs by RMSD and build one consensus motif per cluster.
    Consensus(ConsensusArgs),
    /// Superimpose two motifs residue by residue and report the transformation.
    Superimpose(SuperimposeArgs),
}

/// Arguments for the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    // --- Inputs ---
    /// PDB file holding the query motif.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub motif: PathBuf,

    /// Residues of the motif file that form the query, in order (e.g., 'A:57,A:102,A:195').
    /// Defaults to every residue of the first model.
    #[arg(short, long, value_name = "KEYS")]
    pub residues: Option<String>,

    /// PDB file to search.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub target: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Search Overrides ---
    /// Matches must have an RMSD strictly below this value (Å).
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Allowed deviation between candidate and query inter-residue distances (Å).
    #[arg(long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// Enumerate every match ('exhaustive') or stop at the first one ('first-match').
    #[arg(long, value_name = "MODE")]
    pub mode: Option<SearchMode>,

    /// Atoms used for superposition: 'backbone', 'alpha-carbon', 'side-chain',
    /// 'all-shared' or a comma-separated list of atom names.
    #[arg(short, long, value_name = "SELECTION")]
    pub atoms: Option<AtomSelection>,

    /// Per-residue point used to prune candidates: 'alpha-carbon' or 'centroid'.
    #[arg(long, value_name = "POINT")]
    pub reference_point: Option<ReferencePoint>,

    /// Draw candidates from each chain separately ('per-chain') or from all chains ('pooled').
    #[arg(long, value_name = "SCOPE")]
    pub chain_scope: Option<ChainScope>,

    /// Restrict candidates to these chains (e.g., 'A,B').
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub chains: Vec<char>,

    /// Keep at most this many ranked matches.
    #[arg(short = 'n', long, value_name = "INT")]
    pub max_results: Option<usize>,

    /// Stop the search after this many seconds and report partial results.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    // --- Residue Exchanges ---
    /// Allow a motif residue to match other families. Can be used multiple times.
    /// Example: --exchange A:102=GLU,ASN
    #[arg(short = 'x', long = "exchange", value_name = "KEY=FAMILIES")]
    pub exchanges: Vec<String>,

    /// Add every family scoring at least this value against each motif residue
    /// in the substitution matrix as an allowed exchange.
    #[arg(long, value_name = "MIN_SCORE", allow_hyphen_values = true)]
    pub suggest_exchanges: Option<i32>,

    /// Substitution matrix in CSV format. Defaults to BLOSUM62 when one is needed.
    #[arg(long, value_name = "PATH")]
    pub matrix: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S search.rmsd-cutoff=1.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    // --- Outputs ---
    /// Write the ranking as CSV to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write each match, superimposed onto the query, as a PDB file in this directory.
    #[arg(long, value_name = "DIR")]
    pub aligned_dir: Option<PathBuf>,
}

/// Clustering algorithm selectable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodArg {
    /// Average-linkage tree cut at a merge-distance threshold.
    Hierarchical,
    /// Affinity propagation on negated RMSD similarities.
    #[value(alias = "affinity-propagation")]
    Affinity,
}

/// Arguments for the `consensus` subcommand.
#[derive(Args, Debug)]
pub struct ConsensusArgs {
    /// PDB files, one motif per file.
    #[arg(required = true, num_args = 1.., value_name = "PATHS")]
    pub motifs: Vec<PathBuf>,

    /// Residues taken from every motif file, in order. Defaults to every residue.
    #[arg(short, long, value_name = "KEYS")]
    pub residues: Option<String>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Clustering algorithm.
    #[arg(long, value_enum, value_name = "METHOD")]
    pub method: Option<MethodArg>,

    /// Merge-distance cut for hierarchical clustering (Å).
    #[arg(long, value_name = "FLOAT")]
    pub threshold: Option<f64>,

    /// Self-similarity for affinity propagation. Defaults to the median similarity.
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true)]
    pub preference: Option<f64>,

    /// Damping factor for affinity propagation, in [0.5, 1).
    #[arg(long, value_name = "FLOAT")]
    pub damping: Option<f64>,

    /// Atoms used for superposition (same values as `search --atoms`).
    #[arg(short, long, value_name = "SELECTION")]
    pub atoms: Option<AtomSelection>,

    /// Substitution matrix in CSV format used for conservation scores. Defaults to BLOSUM62.
    #[arg(long, value_name = "PATH")]
    pub matrix: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S consensus.threshold=0.8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    /// Write the cluster tree in Newick format (hierarchical clustering only).
    #[arg(long, value_name = "PATH")]
    pub newick: Option<PathBuf>,

    /// Write each consensus motif as a PDB file in this directory.
    #[arg(long, value_name = "DIR")]
    pub consensus_dir: Option<PathBuf>,
}

/// Arguments for the `superimpose` subcommand.
#[derive(Args, Debug)]
pub struct SuperimposeArgs {
    /// PDB file holding the reference motif.
    #[arg(required = true, value_name = "REFERENCE")]
    pub reference: PathBuf,

    /// PDB file holding the motif moved onto the reference.
    #[arg(required = true, value_name = "CANDIDATE")]
    pub candidate: PathBuf,

    /// Residues of the reference file, in order. Defaults to every residue.
    #[arg(long, value_name = "KEYS")]
    pub reference_residues: Option<String>,

    /// Residues of the candidate file, in order. Defaults to every residue.
    #[arg(long, value_name = "KEYS")]
    pub candidate_residues: Option<String>,

    /// Atoms used for superposition (same values as `search --atoms`).
    #[arg(short, long, value_name = "SELECTION")]
    pub atoms: Option<AtomSelection>,

    /// Write the transformed candidate to this PDB file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_arguments_parse_into_typed_values() {
        let cli = Cli::try_parse_from([
            "motifscan",
            "-vv",
            "search",
            "--motif",
            "triad.pdb",
            "--target",
            "1abc.pdb",
            "--mode",
            "first-match",
            "--atoms",
            "n,ca,c",
            "--chains",
            "A,B",
            "-x",
            "A:102=GLU",
            "-x",
            "A:57=TYR,PHE",
            "--suggest-exchanges",
            "-1",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Search(args) = cli.command else {
            panic!("expected the search subcommand");
        };
        assert_eq!(args.mode, Some(SearchMode::FirstMatch));
        assert_eq!(
            args.atoms,
            Some(AtomSelection::Custom(vec!["N".into(), "CA".into(), "C".into()]))
        );
        assert_eq!(args.chains, vec!['A', 'B']);
        assert_eq!(args.exchanges.len(), 2);
        assert_eq!(args.suggest_exchanges, Some(-1));
        assert!(args.output.is_none());
    }

    #[test]
    fn consensus_accepts_several_motif_files() {
        let cli = Cli::try_parse_from([
            "motifscan",
            "consensus",
            "a.pdb",
            "b.pdb",
            "c.pdb",
            "--method",
            "affinity",
            "--preference",
            "-2.5",
        ])
        .unwrap();
        let Commands::Consensus(args) = cli.command else {
            panic!("expected the consensus subcommand");
        };
        assert_eq!(args.motifs.len(), 3);
        assert_eq!(args.method, Some(MethodArg::Affinity));
        assert_eq!(args.preference, Some(-2.5));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["motifscan", "-q", "-v", "superimpose", "a.pdb", "b.pdb"]);
        assert!(result.is_err());
    }
}
