use thiserror::Error;

/// Table-level failures while building the dataset. Row-level problems never
/// reach this type; they are skipped and counted in a `ParseReport`.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("http {status} fetching {url}")]
    Network { url: String, status: u16 },

    #[error("transport error fetching {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("table {table} is missing column {column}")]
    MissingColumn { table: &'static str, column: String },

    #[error("table {table} is empty")]
    EmptyTable { table: &'static str },

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("need at least {required} playable countries, found {available}")]
    InsufficientData { available: usize, required: usize },

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

impl DatasetError {
    /// True for failures a manual retry may clear.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DatasetError::Network { .. } | DatasetError::Transport { .. }
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreTableError {
    #[error("score table needs exactly {expected} levels, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("points for level {level} exceed points for the level before it")]
    Increasing { level: usize },
}

/// `err` followed by each of its sources, joined with ": ".
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
