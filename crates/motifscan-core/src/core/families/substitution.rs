use super::family::Family;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const BLOSUM62_CSV: &str = include_str!("../../../data/blosum62.csv");

#[derive(Debug, Error)]
pub enum SubstitutionLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unknown residue label '{0}' in substitution matrix")]
    UnknownLabel(String),
    #[error("Duplicate residue label '{0}' in substitution matrix")]
    DuplicateLabel(String),
    #[error("Invalid score '{value}' for pair ({row}, {column})")]
    InvalidScore {
        row: String,
        column: String,
        value: String,
    },
    #[error("Matrix is not square: {rows} rows for {columns} labeled columns")]
    NotSquare { rows: usize, columns: usize },
    #[error("Row label '{found}' does not match column label '{expected}' at position {position}")]
    LabelOrder {
        position: usize,
        expected: String,
        found: String,
    },
    #[error("Matrix is not symmetric: score({a}, {b}) = {ab} but score({b}, {a}) = {ba}")]
    Asymmetric {
        a: Family,
        b: Family,
        ab: i32,
        ba: i32,
    },
}

/// A labeled, symmetric residue substitution score matrix (e.g. BLOSUM62).
///
/// Matrices are plain immutable values: build one at start-up and pass it by
/// reference to whatever needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionMatrix {
    name: String,
    families: Vec<Family>,
    index: HashMap<Family, usize>,
    scores: Vec<i32>,
}

impl SubstitutionMatrix {
    /// The bundled BLOSUM62 amino acid matrix.
    pub fn blosum62() -> Self {
        // The bundled table is validated by the test suite.
        Self::from_reader("BLOSUM62", BLOSUM62_CSV.as_bytes())
            .unwrap_or_else(|e| panic!("bundled BLOSUM62 table is malformed: {e}"))
    }

    pub fn load(path: &Path) -> Result<Self, SubstitutionLoadError> {
        let file = std::fs::File::open(path).map_err(|e| SubstitutionLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "custom".to_string());
        Self::from_reader(&name, file)
    }

    /// Parses a CSV table whose header row holds the column labels (after a
    /// leading label column) and whose rows start with the matching row label.
    ///
    /// Single-character labels are read as one-letter amino acid codes; longer
    /// labels as residue names (so nucleotide matrices use `DA`, `DC`, ...).
    pub fn from_reader(name: &str, reader: impl Read) -> Result<Self, SubstitutionLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let labels: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
        let families = labels
            .iter()
            .map(|label| parse_label(label))
            .collect::<Result<Vec<_>, _>>()?;

        let mut index = HashMap::with_capacity(families.len());
        for (i, (&family, label)) in families.iter().zip(&labels).enumerate() {
            if index.insert(family, i).is_some() {
                return Err(SubstitutionLoadError::DuplicateLabel(label.clone()));
            }
        }

        let n = families.len();
        let mut scores = Vec::with_capacity(n * n);
        let mut rows = 0;
        for record in csv_reader.records() {
            let record = record?;
            let row_label = record.get(0).unwrap_or_default().to_string();
            if rows >= n {
                return Err(SubstitutionLoadError::NotSquare {
                    rows: rows + 1,
                    columns: n,
                });
            }
            if parse_label(&row_label)? != families[rows] {
                return Err(SubstitutionLoadError::LabelOrder {
                    position: rows,
                    expected: labels[rows].clone(),
                    found: row_label,
                });
            }
            if record.len() != n + 1 {
                return Err(SubstitutionLoadError::NotSquare {
                    rows: n,
                    columns: record.len().saturating_sub(1),
                });
            }
            for (column, value) in record.iter().skip(1).enumerate() {
                let score = value
                    .parse::<i32>()
                    .map_err(|_| SubstitutionLoadError::InvalidScore {
                        row: row_label.clone(),
                        column: labels[column].clone(),
                        value: value.to_string(),
                    })?;
                scores.push(score);
            }
            rows += 1;
        }

        if rows != n {
            return Err(SubstitutionLoadError::NotSquare { rows, columns: n });
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let (ab, ba) = (scores[i * n + j], scores[j * n + i]);
                if ab != ba {
                    return Err(SubstitutionLoadError::Asymmetric {
                        a: families[i],
                        b: families[j],
                        ab,
                        ba,
                    });
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            families,
            index,
            scores,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn contains(&self, family: Family) -> bool {
        self.index.contains_key(&family)
    }

    pub fn score(&self, a: Family, b: Family) -> Option<i32> {
        let i = *self.index.get(&a)?;
        let j = *self.index.get(&b)?;
        Some(self.scores[i * self.families.len() + j])
    }

    /// Families scoring at least `min_score` against `family`, best first.
    ///
    /// These are suggestions for a caller to declare as exchanges; the matrix
    /// never widens a residue's exchange set on its own.
    pub fn suggest_exchanges(&self, family: Family, min_score: i32) -> Vec<Family> {
        let mut suggestions: Vec<(i32, Family)> = self
            .families
            .iter()
            .filter(|&&other| other != family)
            .filter_map(|&other| {
                self.score(family, other)
                    .filter(|&s| s >= min_score)
                    .map(|s| (s, other))
            })
            .collect();
        suggestions.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        suggestions.into_iter().map(|(_, f)| f).collect()
    }

    /// Ungapped positional score of two equal-length family sequences.
    /// Returns `None` on a length mismatch or when a family is not covered.
    pub fn score_sequences(&self, a: &[Family], b: &[Family]) -> Option<i32> {
        if a.len() != b.len() {
            return None;
        }
        a.iter()
            .zip(b)
            .map(|(&x, &y)| self.score(x, y))
            .sum::<Option<i32>>()
    }
}

fn parse_label(label: &str) -> Result<Family, SubstitutionLoadError> {
    let mut chars = label.chars();
    let parsed = match (chars.next(), chars.next()) {
        (Some(c), None) => Family::amino_acid_from_one_letter(c),
        _ => Family::from_residue_name(label),
    };
    parsed.ok_or_else(|| SubstitutionLoadError::UnknownLabel(label.to_string()))
}
