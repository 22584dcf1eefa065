use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for the batch pipeline.
///
/// Data-quality gate outcomes are deliberately absent: a failed gate is a
/// reported result that ends the run cleanly, not an error (see the
/// `retail-validate` crate).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or missing configuration value. Aborts before any stage runs.
    #[error("configuration error: {0}")]
    Config(String),

    /// The two condition-union branches produced incompatible column sets.
    #[error("schema mismatch in condition union: left columns {left:?}, right columns {right:?}")]
    SchemaMismatch {
        left: Vec<String>,
        right: Vec<String>,
    },

    /// The final column ordering references a column absent after renaming.
    #[error("column '{0}' not found after renaming")]
    MissingColumn(String),

    /// A date column value does not conform to the expected representation.
    #[error("cannot parse '{value}' in column '{column}' (row {row}) as a {format} date")]
    Parse {
        column: String,
        value: String,
        row: usize,
        format: &'static str,
    },

    /// Propagated from the writer collaborator.
    #[error("failed to write dataset to {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv read error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
