use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{CoreError, Result};

/// Validated significance threshold for every sub-check in a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Significance(f64);

impl Significance {
    pub fn new(alpha: f64) -> Result<Self> {
        if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
            return Err(CoreError::InvalidAlpha(alpha));
        }
        Ok(Self(alpha))
    }

    pub fn alpha(&self) -> f64 {
        self.0
    }
}

impl Default for Significance {
    fn default() -> Self {
        Self(0.05)
    }
}

/// Record of one A/B comparison: which metric was tested, how large the
/// groups were, and (when loaded from a file) a fingerprint of the data.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Experiment {
    pub id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub metric: String,
    pub control_count: usize,
    pub test_count: usize,
    pub dataset_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Experiment {
    pub fn new(
        name: String,
        metric: String,
        control_count: usize,
        test_count: usize,
        dataset_fingerprint: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            metric,
            control_count,
            test_count,
            dataset_fingerprint,
            created_at: Utc::now(),
        }
    }
}
