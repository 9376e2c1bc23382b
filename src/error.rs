use std::path::PathBuf;

/// Fatal errors: analysis cannot proceed past any of these.
///
/// Per-record problems (bad rows, unparseable timestamps, negative delivery
/// durations) are not errors; they are dropped and counted in the step reports.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("missing input table '{table}': {path} not found")]
    MissingFile { table: &'static str, path: PathBuf },

    #[error("table '{table}' is missing required column '{column}'")]
    Schema { table: &'static str, column: &'static str },

    #[error("CSV error in table '{table}': {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
