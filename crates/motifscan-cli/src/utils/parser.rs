use motifscan::core::families::Family;
use motifscan::core::models::residue::ResidueKey;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid residue key '{0}'. Expected 'CHAIN:NUMBER[INSERTION]' (e.g., 'A:57' or 'A:57B').")]
    InvalidResidueKey(String),

    #[error("Invalid exchange '{0}'. Expected 'KEY=FAMILY[,FAMILY...]' (e.g., 'A:102=GLU,ASN').")]
    InvalidExchangeFormat(String),

    #[error("Unknown residue family '{family}' in '{input}'.")]
    UnknownFamily { family: String, input: String },

    #[error("Residue list cannot be empty.")]
    EmptyResidueList,

    #[error("Residue {0} is listed more than once.")]
    DuplicateResidue(ResidueKey),
}

/// Parses a comma- or whitespace-separated list such as `A:57, A:102 B:7`.
pub fn parse_residue_list(input: &str) -> Result<Vec<ResidueKey>, ParseError> {
    let mut keys: Vec<ResidueKey> = Vec::new();
    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let key: ResidueKey = token
            .parse()
            .map_err(|_| ParseError::InvalidResidueKey(token.to_string()))?;
        if keys.contains(&key) {
            return Err(ParseError::DuplicateResidue(key));
        }
        keys.push(key);
    }
    if keys.is_empty() {
        return Err(ParseError::EmptyResidueList);
    }
    Ok(keys)
}

/// Parses `KEY=FAMILY[,FAMILY...]`, e.g. `A:102=GLU,ASN`.
pub fn parse_exchange(input: &str) -> Result<(ResidueKey, Vec<Family>), ParseError> {
    let (key, families) = input
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidExchangeFormat(input.to_string()))?;

    let key: ResidueKey = key
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidResidueKey(key.trim().to_string()))?;

    let families = families
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| {
            f.parse::<Family>().map_err(|_| ParseError::UnknownFamily {
                family: f.to_string(),
                input: input.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if families.is_empty() {
        return Err(ParseError::InvalidExchangeFormat(input.to_string()));
    }
    Ok((key, families))
}

/// Splits a `--set` argument into its key and value.
pub fn parse_key_value(input: &str) -> Option<(&str, &str)> {
    let (key, value) = input.split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then_some((key, value.trim()))
}
