use thiserror::Error;

use ab_lab_core::GroupLabel;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{column}' not found; available columns: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("no rows labeled '{0}' in the input table")]
    EmptyGroup(GroupLabel),

    #[error("row {row}: could not parse '{value}' in column '{column}' as a number")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error(transparent)]
    Core(#[from] ab_lab_core::CoreError),
}

pub type Result<T> = std::result::Result<T, LoaderError>;
