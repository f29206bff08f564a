use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one sub-check: the statistic, its p-value, and the decision
/// against the alpha it was judged with. Created once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
    pub alpha: f64,
    pub reject_null: bool,
}

impl TestResult {
    /// Applies the uniform decision rule `reject_null = p_value < alpha`.
    pub fn evaluate(statistic: f64, p_value: f64, alpha: f64) -> Self {
        Self {
            statistic,
            p_value,
            alpha,
            reject_null: p_value < alpha,
        }
    }
}

/// Which mean-comparison test the pipeline selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanTestVariant {
    /// Two-sample t-test with pooled variance (both groups normal, equal variance).
    StudentT,
    /// Two-sample t-test with Welch's correction (both groups normal, unequal variance).
    WelchT,
    /// Rank-based two-sample location test (normality rejected for a group).
    MannWhitneyU,
}

impl std::fmt::Display for MeanTestVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeanTestVariant::StudentT => write!(f, "two-sample t-test (equal variances)"),
            MeanTestVariant::WelchT => write!(f, "Welch's t-test (unequal variances)"),
            MeanTestVariant::MannWhitneyU => write!(f, "Mann-Whitney U test"),
        }
    }
}

/// Aggregated outcome of a full pipeline run. Assembled once at the end;
/// a report either has all four stage results or is not produced at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub alpha: f64,
    pub control_normality: TestResult,
    pub test_normality: TestResult,
    pub variance_homogeneity: TestResult,
    pub mean_comparison: TestResult,
    pub selected_test: MeanTestVariant,
    pub significant_difference: bool,
    pub rationale: String,
}

impl DecisionReport {
    pub fn new(
        alpha: f64,
        control_normality: TestResult,
        test_normality: TestResult,
        variance_homogeneity: TestResult,
        mean_comparison: TestResult,
        selected_test: MeanTestVariant,
        rationale: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            alpha,
            control_normality,
            test_normality,
            variance_homogeneity,
            mean_comparison,
            selected_test,
            significant_difference: mean_comparison.reject_null,
            rationale,
        }
    }
}

fn interpret(result: &TestResult) -> &'static str {
    if result.reject_null {
        "reject H0"
    } else {
        "fail to reject H0"
    }
}

impl std::fmt::Display for DecisionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "A/B hypothesis test (alpha = {:.2})", self.alpha)?;
        writeln!(
            f,
            "1. Normality (Shapiro-Wilk), Control: Test Stat = {:.4}, pvalue = {:.4} -> {}",
            self.control_normality.statistic,
            self.control_normality.p_value,
            interpret(&self.control_normality),
        )?;
        writeln!(
            f,
            "   Normality (Shapiro-Wilk), Test:    Test Stat = {:.4}, pvalue = {:.4} -> {}",
            self.test_normality.statistic,
            self.test_normality.p_value,
            interpret(&self.test_normality),
        )?;
        writeln!(
            f,
            "2. Variance homogeneity (Levene):     Test Stat = {:.4}, pvalue = {:.4} -> {}",
            self.variance_homogeneity.statistic,
            self.variance_homogeneity.p_value,
            interpret(&self.variance_homogeneity),
        )?;
        writeln!(
            f,
            "3. {}: Test Stat = {:.4}, pvalue = {:.4} -> {}",
            self.selected_test,
            self.mean_comparison.statistic,
            self.mean_comparison.p_value,
            interpret(&self.mean_comparison),
        )?;
        if self.significant_difference {
            writeln!(
                f,
                "Verdict: statistically significant difference between group means; reject H0."
            )?;
        } else {
            writeln!(
                f,
                "Verdict: no statistically significant difference; fail to reject H0."
            )?;
        }
        write!(f, "{}", self.rationale)
    }
}
