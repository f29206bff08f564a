use thiserror::Error;

use crate::domain::sample::GroupLabel;

/// Pipeline stage at which a check failed. Carried in errors so callers can
/// see exactly which sub-check rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normality,
    VarianceHomogeneity,
    MeanComparison,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Normality => write!(f, "normality check"),
            Stage::VarianceHomogeneity => write!(f, "variance homogeneity check"),
            Stage::MeanComparison => write!(f, "mean comparison test"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{group} group has {actual} observations but the {stage} requires at least {required}")]
    InsufficientData {
        group: GroupLabel,
        stage: Stage,
        required: usize,
        actual: usize,
    },

    #[error("{group} group has zero variance; the test statistic is undefined")]
    DegenerateVariance { group: GroupLabel },

    #[error("significance level must be in the open interval (0, 1), got {0}")]
    InvalidAlpha(f64),

    #[error("{group} group contains a non-finite value at index {index}")]
    InvalidValue { group: GroupLabel, index: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
