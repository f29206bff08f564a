//! Three-stage hypothesis-testing pipeline.
//!
//! Normality per group (Shapiro-Wilk), then variance homogeneity (Levene,
//! median-centered), then a mean-comparison test selected from the upstream
//! outcomes. A run moves linearly through
//! NormalityAssessed -> VarianceAssessed -> MeanTestSelected -> Decided;
//! there are no cycles and no partial reports.

use tracing::{debug, info};

use ab_lab_core::{DecisionReport, MeanTestVariant, Result, Sample, Significance, TestResult};

use crate::statistical::StatisticalTests;

/// Pure decision procedure over two independent samples. Each invocation is
/// independent; the pipeline holds no state beyond its significance level
/// and never mutates its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HypothesisTestPipeline {
    significance: Significance,
}

impl HypothesisTestPipeline {
    pub fn new(significance: Significance) -> Self {
        Self { significance }
    }

    pub fn alpha(&self) -> f64 {
        self.significance.alpha()
    }

    /// Runs the full procedure and assembles the decision report.
    ///
    /// Any sub-check failure propagates immediately; there is no silent
    /// fallback to a different test variant on error.
    pub fn run(&self, control: &Sample, test: &Sample) -> Result<DecisionReport> {
        let alpha = self.significance.alpha();

        // Stage 1: normality, each group on its own.
        let control_normality = StatisticalTests::shapiro_wilk(control, alpha)?;
        let test_normality = StatisticalTests::shapiro_wilk(test, alpha)?;
        debug!(
            control_p = control_normality.p_value,
            test_p = test_normality.p_value,
            "normality assessed"
        );

        // Stage 2: variance homogeneity. No data dependency on stage 1, but
        // always run here so reports read in a fixed order.
        let variance_homogeneity = StatisticalTests::levene(control, test, alpha)?;
        debug!(p = variance_homogeneity.p_value, "variance assessed");

        // Stage 3: select and run the mean-comparison test.
        let selected_test = Self::select_mean_test(
            &control_normality,
            &test_normality,
            &variance_homogeneity,
        );
        let mean_comparison = match selected_test {
            MeanTestVariant::MannWhitneyU => {
                StatisticalTests::mann_whitney_u(control, test, alpha)?
            }
            MeanTestVariant::WelchT => StatisticalTests::t_test_welch(control, test, alpha)?,
            MeanTestVariant::StudentT => StatisticalTests::t_test_equal_var(control, test, alpha)?,
        };

        info!(
            %selected_test,
            statistic = mean_comparison.statistic,
            p_value = mean_comparison.p_value,
            significant = mean_comparison.reject_null,
            "pipeline decided"
        );

        let rationale = Self::rationale(
            &control_normality,
            &test_normality,
            &variance_homogeneity,
            selected_test,
        );

        Ok(DecisionReport::new(
            alpha,
            control_normality,
            test_normality,
            variance_homogeneity,
            mean_comparison,
            selected_test,
            rationale,
        ))
    }

    /// Branch selection: a rejected normality check routes to the rank-based
    /// test; otherwise the Levene outcome picks between Welch and the pooled
    /// t-test.
    fn select_mean_test(
        control_normality: &TestResult,
        test_normality: &TestResult,
        variance_homogeneity: &TestResult,
    ) -> MeanTestVariant {
        if control_normality.reject_null || test_normality.reject_null {
            MeanTestVariant::MannWhitneyU
        } else if variance_homogeneity.reject_null {
            MeanTestVariant::WelchT
        } else {
            MeanTestVariant::StudentT
        }
    }

    fn rationale(
        control_normality: &TestResult,
        test_normality: &TestResult,
        variance_homogeneity: &TestResult,
        selected_test: MeanTestVariant,
    ) -> String {
        match selected_test {
            MeanTestVariant::MannWhitneyU => {
                let non_normal = match (
                    control_normality.reject_null,
                    test_normality.reject_null,
                ) {
                    (true, true) => "both groups",
                    (true, false) => "the Control group",
                    _ => "the Test group",
                };
                format!(
                    "Shapiro-Wilk rejected normality for {non_normal}, so a \
                     distribution-free rank test was used in place of a t-test."
                )
            }
            MeanTestVariant::WelchT => format!(
                "Both groups passed the Shapiro-Wilk normality check; Levene's test \
                 rejected equal variances (p = {:.4}), so Welch's correction was applied.",
                variance_homogeneity.p_value
            ),
            MeanTestVariant::StudentT => format!(
                "Both groups passed the Shapiro-Wilk normality check and Levene's test \
                 found no evidence of unequal variances (p = {:.4}), so the pooled-variance \
                 t-test was used.",
                variance_homogeneity.p_value
            ),
        }
    }
}
