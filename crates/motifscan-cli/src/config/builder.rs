use super::defaults::DefaultsConfig;
use super::file::{FileAffinityConfig, FileConfig};
use super::models::{ConsensusAppConfig, SearchAppConfig};
use crate::cli::{ConsensusArgs, MethodArg, SearchArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use clap::ValueEnum;
use motifscan::core::families::SubstitutionMatrix;
use motifscan::engine::config::{
    self as core_config, AffinityPropagationConfig, AtomSelection, ChainScope, ReferencePoint, SearchMode,
};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub fn build_search_config(args: &SearchArgs) -> Result<SearchAppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = load_file_config(args.config.as_deref())?;
    let file_config = apply_set_values(file_config, &args.set_values)?;
    let file = file_config.search.unwrap_or_default();

    let rmsd_cutoff = args
        .cutoff
        .or(file.rmsd_cutoff)
        .unwrap_or(defaults.rmsd_cutoff);
    let distance_tolerance = args
        .tolerance
        .or(file.distance_tolerance)
        .unwrap_or(defaults.distance_tolerance);

    let atoms = match &args.atoms {
        Some(atoms) => atoms.clone(),
        None => parse_setting::<AtomSelection>("search.atoms", file.atoms.as_deref())?
            .unwrap_or(defaults.search_atoms),
    };
    let reference_point = match args.reference_point {
        Some(point) => point,
        None => parse_setting::<ReferencePoint>("search.reference-point", file.reference_point.as_deref())?
            .unwrap_or(defaults.reference_point),
    };
    let chain_scope = match args.chain_scope {
        Some(scope) => scope,
        None => parse_setting::<ChainScope>("search.chain-scope", file.chain_scope.as_deref())?
            .unwrap_or(defaults.chain_scope),
    };
    let mode = match args.mode {
        Some(mode) => mode,
        None => parse_setting::<SearchMode>("search.mode", file.mode.as_deref())?.unwrap_or(defaults.mode),
    };

    let chains = if args.chains.is_empty() {
        file.chains
    } else {
        Some(args.chains.clone())
    };
    let max_results = args.max_results.or(file.max_results);

    let timeout = match args.timeout.or(file.timeout_seconds) {
        Some(seconds) if seconds.is_finite() && seconds > 0.0 => Some(Duration::from_secs_f64(seconds)),
        Some(seconds) => {
            return Err(CliError::Config(format!(
                "Timeout must be a positive number of seconds, got {seconds}"
            )));
        }
        None => None,
    };

    let matrix_path = args.matrix.clone().or(file.substitution_matrix);
    let matrix = match matrix_path {
        Some(path) => Some(Arc::new(load_matrix(&path)?)),
        None if args.suggest_exchanges.is_some() => Some(Arc::new(SubstitutionMatrix::blosum62())),
        None => None,
    };

    let mut builder = core_config::SearchConfigBuilder::new()
        .rmsd_cutoff(rmsd_cutoff)
        .distance_tolerance(distance_tolerance)
        .atoms(atoms)
        .reference_point(reference_point)
        .chain_scope(chain_scope)
        .mode(mode);
    if let Some(chains) = chains {
        builder = builder.chains(chains);
    }
    if let Some(limit) = max_results {
        builder = builder.max_results(limit);
    }
    if let Some(matrix) = &matrix {
        builder = builder.substitution_matrix(matrix.clone());
    }
    let core_config = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

    debug!(?core_config, ?timeout, "Resolved search configuration.");
    Ok(SearchAppConfig {
        core_config,
        matrix,
        timeout,
    })
}

pub fn build_consensus_config(args: &ConsensusArgs) -> Result<ConsensusAppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = load_file_config(args.config.as_deref())?;
    let file_config = apply_set_values(file_config, &args.set_values)?;
    let file = file_config.consensus.unwrap_or_default();

    let atoms = match &args.atoms {
        Some(atoms) => atoms.clone(),
        None => parse_setting::<AtomSelection>("consensus.atoms", file.atoms.as_deref())?
            .unwrap_or_else(|| defaults.consensus_atoms.clone()),
    };
    let method = match (args.method, file.method.as_deref()) {
        (Some(method), _) => method,
        (None, Some(name)) => MethodArg::from_str(name, true).map_err(|_| {
            CliError::Config(format!(
                "Invalid value for consensus.method: '{name}' (expected 'hierarchical' or 'affinity')"
            ))
        })?,
        (None, None) => MethodArg::Hierarchical,
    };

    let builder = core_config::ConsensusConfigBuilder::new().atoms(atoms);
    let builder = match method {
        MethodArg::Hierarchical => {
            let threshold = args
                .threshold
                .or(file.threshold)
                .unwrap_or(defaults.cluster_threshold);
            builder.hierarchical(threshold)
        }
        MethodArg::Affinity => {
            let affinity = file.affinity.unwrap_or_default();
            builder.affinity_propagation(merge_affinity(args, affinity, &defaults))
        }
    };
    let core_config = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

    let matrix = match args.matrix.clone().or(file.substitution_matrix) {
        Some(path) => load_matrix(&path)?,
        None => SubstitutionMatrix::blosum62(),
    };

    debug!(?core_config, matrix = matrix.name(), "Resolved consensus configuration.");
    Ok(ConsensusAppConfig { core_config, matrix })
}

fn merge_affinity(
    args: &ConsensusArgs,
    file: FileAffinityConfig,
    defaults: &DefaultsConfig,
) -> AffinityPropagationConfig {
    AffinityPropagationConfig {
        damping: args.damping.or(file.damping).unwrap_or(defaults.damping),
        max_iterations: file.max_iterations.unwrap_or(defaults.max_iterations),
        convergence_iterations: file
            .convergence_iterations
            .unwrap_or(defaults.convergence_iterations),
        preference: args.preference.or(file.preference),
    }
}

fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    match path {
        Some(path) => FileConfig::from_file(path),
        None => Ok(FileConfig::default()),
    }
}

fn load_matrix(path: &Path) -> Result<SubstitutionMatrix> {
    debug!("Loading substitution matrix from {:?}", path);
    SubstitutionMatrix::load(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

fn parse_setting<T>(key: &str, value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| CliError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid numeric value for {key}: {value}")))
}

fn parse_chains(key: &str, value: &str) -> Result<Vec<char>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            let mut chars = id.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(CliError::Config(format!(
                    "Invalid chain identifier for {key}: '{id}'"
                ))),
            }
        })
        .collect()
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value) = parser::parse_key_value(kv_pair).ok_or_else(|| {
            CliError::Config(format!(
                "Invalid --set format: '{kv_pair}'. Expected KEY=VALUE."
            ))
        })?;

        if let Some(field) = key.strip_prefix("search.") {
            let search = config.search.get_or_insert_with(Default::default);
            match field {
                "rmsd-cutoff" => search.rmsd_cutoff = Some(parse_number(key, value)?),
                "distance-tolerance" => search.distance_tolerance = Some(parse_number(key, value)?),
                "atoms" => search.atoms = Some(value.to_string()),
                "reference-point" => search.reference_point = Some(value.to_string()),
                "chain-scope" => search.chain_scope = Some(value.to_string()),
                "chains" => search.chains = Some(parse_chains(key, value)?),
                "mode" => search.mode = Some(value.to_string()),
                "max-results" => search.max_results = Some(parse_number(key, value)?),
                "timeout-seconds" => search.timeout_seconds = Some(parse_number(key, value)?),
                "substitution-matrix" => search.substitution_matrix = Some(PathBuf::from(value)),
                _ => return Err(unsupported_key(key)),
            }
        } else if let Some(field) = key.strip_prefix("consensus.affinity.") {
            let affinity = config
                .consensus
                .get_or_insert_with(Default::default)
                .affinity
                .get_or_insert_with(Default::default);
            match field {
                "damping" => affinity.damping = Some(parse_number(key, value)?),
                "max-iterations" => affinity.max_iterations = Some(parse_number(key, value)?),
                "convergence-iterations" => {
                    affinity.convergence_iterations = Some(parse_number(key, value)?)
                }
                "preference" => affinity.preference = Some(parse_number(key, value)?),
                _ => return Err(unsupported_key(key)),
            }
        } else if let Some(field) = key.strip_prefix("consensus.") {
            let consensus = config.consensus.get_or_insert_with(Default::default);
            match field {
                "atoms" => consensus.atoms = Some(value.to_string()),
                "method" => consensus.method = Some(value.to_string()),
                "threshold" => consensus.threshold = Some(parse_number(key, value)?),
                "substitution-matrix" => consensus.substitution_matrix = Some(PathBuf::from(value)),
                _ => return Err(unsupported_key(key)),
            }
        } else {
            return Err(unsupported_key(key));
        }
    }
    Ok(config)
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{key}'"))
}
