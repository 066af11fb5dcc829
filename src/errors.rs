//! Error types shared by the matching pipeline.

use thiserror::Error;

/// Caller-side mistakes detected before any embedding work starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("no columns selected for matching")]
    NoColumnsSelected,
    #[error("column `{column}` is missing from the {side} dataset")]
    UnknownColumn { column: String, side: DatasetSide },
    #[error("destination dataset has no rows to match against")]
    EmptyDestination,
    #[error("URL column `{0}` not found in header")]
    MissingUrlColumn(String),
    #[error("duplicate column `{0}` in header")]
    DuplicateColumn(String),
    #[error("dataset has no header row")]
    MissingHeader,
}

/// Which of the two datasets an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSide {
    Origin,
    Destination,
}

impl std::fmt::Display for DatasetSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetSide::Origin => f.write_str("origin"),
            DatasetSide::Destination => f.write_str("destination"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to load embedding model: {0}")]
    Load(String),
    #[error("failed to generate embeddings: {0}")]
    Inference(String),
    #[error("embedder returned {actual} vectors for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },
    #[error("embedder returned vectors of mixed dimension ({expected} and {actual})")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot build an index from zero vectors")]
    Empty,
    #[error("vector has dimension {actual}, index expects {expected}")]
    Dimension { expected: usize, actual: usize },
    #[error("vector index backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write matches: {0}")]
    Write(#[from] std::io::Error),
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize matches: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Any failure of a matching run. No partial results accompany it.
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

pub type MatcherResult<T> = Result<T, MatcherError>;
