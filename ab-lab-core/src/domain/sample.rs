use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Which arm of the experiment a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupLabel {
    Control,
    Test,
}

impl std::fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupLabel::Control => write!(f, "Control"),
            GroupLabel::Test => write!(f, "Test"),
        }
    }
}

impl std::str::FromStr for GroupLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "control" => Ok(GroupLabel::Control),
            "test" => Ok(GroupLabel::Test),
            other => Err(CoreError::Validation(format!(
                "unknown group label: {other}"
            ))),
        }
    }
}

/// One group's metric values, in observation order.
///
/// Construction rejects empty input and non-finite values; the per-test
/// minimum lengths (3 for normality, 2 for the variance and mean tests) are
/// enforced by the checks themselves so the error can name the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    label: GroupLabel,
    values: Vec<f64>,
}

impl Sample {
    pub fn new(label: GroupLabel, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(CoreError::Validation(format!(
                "{label} group is empty"
            )));
        }
        for (index, v) in values.iter().enumerate() {
            if !v.is_finite() {
                return Err(CoreError::InvalidValue {
                    group: label,
                    index,
                });
            }
        }
        Ok(Self { label, values })
    }

    pub fn label(&self) -> GroupLabel {
        self.label
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Sample variance (n - 1 denominator). Zero for a single observation.
    pub fn variance(&self) -> f64 {
        let n = self.values.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        self.values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn median(&self) -> f64 {
        let mut sorted = self.values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = sorted.len();
        if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        }
    }
}
