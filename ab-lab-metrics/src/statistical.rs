use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use ab_lab_core::{CoreError, Result, Sample, Stage, TestResult};

/// Largest sample size the Shapiro-Wilk p-value approximation is specified
/// for (Royston 1995).
const SHAPIRO_MAX_N: usize = 5000;

pub struct StatisticalTests;

impl StatisticalTests {
    /// Shapiro-Wilk normality test (AS R94, Royston 1995).
    ///
    /// H0: the sample was drawn from a normal distribution. Each group is
    /// tested on its own, never pooled with the other.
    pub fn shapiro_wilk(sample: &Sample, alpha: f64) -> Result<TestResult> {
        let n = sample.len();
        if n < 3 {
            return Err(CoreError::InsufficientData {
                group: sample.label(),
                stage: Stage::Normality,
                required: 3,
                actual: n,
            });
        }
        if n > SHAPIRO_MAX_N {
            return Err(CoreError::Validation(format!(
                "Shapiro-Wilk approximation is valid up to {SHAPIRO_MAX_N} observations, got {n}"
            )));
        }

        let mut sorted = sample.values().to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mean = sample.mean();
        let ss_total: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
        if ss_total <= 0.0 {
            return Err(CoreError::DegenerateVariance {
                group: sample.label(),
            });
        }

        let w = Self::shapiro_statistic(&sorted, ss_total)?;
        let p_value = Self::shapiro_p_value(w, n);

        Ok(TestResult::evaluate(w, p_value, alpha))
    }

    /// Levene's test for equality of variances, median-centered
    /// (Brown-Forsythe variant, robust to non-normality).
    ///
    /// H0: the two groups have equal variance. One-way ANOVA F on the
    /// absolute deviations from each group's median.
    pub fn levene(control: &Sample, test: &Sample, alpha: f64) -> Result<TestResult> {
        for sample in [control, test] {
            if sample.len() < 2 {
                return Err(CoreError::InsufficientData {
                    group: sample.label(),
                    stage: Stage::VarianceHomogeneity,
                    required: 2,
                    actual: sample.len(),
                });
            }
        }

        let z_control = Self::abs_deviations_from_median(control);
        let z_test = Self::abs_deviations_from_median(test);

        let n1 = z_control.len() as f64;
        let n2 = z_test.len() as f64;
        let total = n1 + n2;

        let mean1 = z_control.iter().sum::<f64>() / n1;
        let mean2 = z_test.iter().sum::<f64>() / n2;
        let grand_mean = (z_control.iter().sum::<f64>() + z_test.iter().sum::<f64>()) / total;

        let ss_between = n1 * (mean1 - grand_mean).powi(2) + n2 * (mean2 - grand_mean).powi(2);
        let ss_within: f64 = z_control.iter().map(|z| (z - mean1).powi(2)).sum::<f64>()
            + z_test.iter().map(|z| (z - mean2).powi(2)).sum::<f64>();

        let df_between = 1.0;
        let df_within = total - 2.0;

        let (statistic, p_value) = if ss_within <= 0.0 {
            // Every deviation identical within each group. Either the groups
            // agree perfectly (no evidence) or they differ exactly.
            if ss_between <= 0.0 {
                (0.0, 1.0)
            } else {
                (f64::INFINITY, 0.0)
            }
        } else {
            let f_stat = (ss_between / df_between) / (ss_within / df_within);
            let f_dist = FisherSnedecor::new(df_between, df_within)
                .map_err(|e| CoreError::Validation(e.to_string()))?;
            (f_stat, 1.0 - f_dist.cdf(f_stat))
        };

        Ok(TestResult::evaluate(statistic, p_value, alpha))
    }

    /// Standard two-sample t-test with pooled variance (`equal_var = true`).
    ///
    /// H0: the group means are equal.
    pub fn t_test_equal_var(control: &Sample, test: &Sample, alpha: f64) -> Result<TestResult> {
        Self::check_t_test_inputs(control, test)?;

        let n1 = control.len() as f64;
        let n2 = test.len() as f64;
        let pooled_var = ((n1 - 1.0) * control.variance() + (n2 - 1.0) * test.variance())
            / (n1 + n2 - 2.0);

        let t_stat = (control.mean() - test.mean()) / (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt();
        let df = n1 + n2 - 2.0;
        let p_value = Self::student_t_two_sided(t_stat, df)?;

        Ok(TestResult::evaluate(t_stat, p_value, alpha))
    }

    /// Two-sample t-test with Welch's correction (`equal_var = false`),
    /// Welch-Satterthwaite degrees of freedom.
    pub fn t_test_welch(control: &Sample, test: &Sample, alpha: f64) -> Result<TestResult> {
        Self::check_t_test_inputs(control, test)?;

        let n1 = control.len() as f64;
        let n2 = test.len() as f64;
        let v1 = control.variance() / n1;
        let v2 = test.variance() / n2;

        let t_stat = (control.mean() - test.mean()) / (v1 + v2).sqrt();
        let df = (v1 + v2).powi(2) / (v1 * v1 / (n1 - 1.0) + v2 * v2 / (n2 - 1.0));
        let p_value = Self::student_t_two_sided(t_stat, df)?;

        Ok(TestResult::evaluate(t_stat, p_value, alpha))
    }

    /// Mann-Whitney U test: rank-based two-sample location test, used when a
    /// normality check fails. Normal approximation with tie correction.
    pub fn mann_whitney_u(control: &Sample, test: &Sample, alpha: f64) -> Result<TestResult> {
        for sample in [control, test] {
            if sample.len() < 2 {
                return Err(CoreError::InsufficientData {
                    group: sample.label(),
                    stage: Stage::MeanComparison,
                    required: 2,
                    actual: sample.len(),
                });
            }
        }

        let n1 = control.len();
        let n2 = test.len();

        let mut combined: Vec<(f64, u8)> = control
            .values()
            .iter()
            .map(|&x| (x, 1))
            .chain(test.values().iter().map(|&x| (x, 2)))
            .collect();
        combined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        // Midranks for ties; track tie group sizes for the variance correction.
        let mut rank_sum1 = 0.0;
        let mut tie_term = 0.0;
        let mut i = 0;
        while i < combined.len() {
            let mut j = i;
            while j < combined.len() && combined[j].0 == combined[i].0 {
                j += 1;
            }
            let rank = (i + j + 1) as f64 / 2.0;
            let ties = (j - i) as f64;
            if j - i > 1 {
                tie_term += ties.powi(3) - ties;
            }
            for entry in &combined[i..j] {
                if entry.1 == 1 {
                    rank_sum1 += rank;
                }
            }
            i = j;
        }

        let u1 = rank_sum1 - (n1 * (n1 + 1)) as f64 / 2.0;
        let u2 = (n1 * n2) as f64 - u1;
        let u = u1.min(u2);

        let n = (n1 + n2) as f64;
        let mean_u = (n1 * n2) as f64 / 2.0;
        let var_u =
            (n1 * n2) as f64 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

        let p_value = if var_u <= 0.0 {
            // All observations tied across both groups; no evidence either way.
            1.0
        } else {
            let z = (u - mean_u) / var_u.sqrt();
            let normal =
                Normal::new(0.0, 1.0).map_err(|e| CoreError::Validation(e.to_string()))?;
            (2.0 * (1.0 - normal.cdf(z.abs()))).min(1.0)
        };

        Ok(TestResult::evaluate(u, p_value, alpha))
    }

    fn check_t_test_inputs(control: &Sample, test: &Sample) -> Result<()> {
        for sample in [control, test] {
            if sample.len() < 2 {
                return Err(CoreError::InsufficientData {
                    group: sample.label(),
                    stage: Stage::MeanComparison,
                    required: 2,
                    actual: sample.len(),
                });
            }
            if sample.variance() <= 0.0 {
                return Err(CoreError::DegenerateVariance {
                    group: sample.label(),
                });
            }
        }
        Ok(())
    }

    fn student_t_two_sided(t_stat: f64, df: f64) -> Result<f64> {
        let t_dist =
            StudentsT::new(0.0, 1.0, df).map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(2.0 * (1.0 - t_dist.cdf(t_stat.abs())))
    }

    fn abs_deviations_from_median(sample: &Sample) -> Vec<f64> {
        let median = sample.median();
        sample.values().iter().map(|&x| (x - median).abs()).collect()
    }

    /// W statistic from the sorted data: squared correlation between the
    /// order statistics and the expected normal scores, with Royston's
    /// polynomial corrections to the two tail weights.
    fn shapiro_statistic(sorted: &[f64], ss_total: f64) -> Result<f64> {
        let n = sorted.len();
        let nf = n as f64;
        let normal = Normal::new(0.0, 1.0).map_err(|e| CoreError::Validation(e.to_string()))?;

        // Blom scores m_i = Phi^-1((i - 0.375) / (n + 0.25))
        let m: Vec<f64> = (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
            .collect();
        let ss_m: f64 = m.iter().map(|v| v * v).sum();

        let mut a = vec![0.0; n];
        if n == 3 {
            a[2] = std::f64::consts::FRAC_1_SQRT_2;
            a[0] = -a[2];
        } else {
            let u = 1.0 / nf.sqrt();
            let c_n = m[n - 1] / ss_m.sqrt();
            let a_n = c_n
                + 0.221157 * u
                - 0.147981 * u.powi(2)
                - 2.071190 * u.powi(3)
                + 4.434685 * u.powi(4)
                - 2.706056 * u.powi(5);

            let (phi, tail) = if n > 5 {
                let c_n1 = m[n - 2] / ss_m.sqrt();
                let a_n1 = c_n1
                    + 0.042981 * u
                    - 0.293762 * u.powi(2)
                    - 1.752461 * u.powi(3)
                    + 5.682633 * u.powi(4)
                    - 3.582633 * u.powi(5);
                let phi = (ss_m - 2.0 * m[n - 1].powi(2) - 2.0 * m[n - 2].powi(2))
                    / (1.0 - 2.0 * a_n.powi(2) - 2.0 * a_n1.powi(2));
                a[n - 1] = a_n;
                a[n - 2] = a_n1;
                a[0] = -a_n;
                a[1] = -a_n1;
                (phi, 2)
            } else {
                let phi = (ss_m - 2.0 * m[n - 1].powi(2)) / (1.0 - 2.0 * a_n.powi(2));
                a[n - 1] = a_n;
                a[0] = -a_n;
                (phi, 1)
            };

            let scale = phi.sqrt();
            for i in tail..n - tail {
                a[i] = m[i] / scale;
            }
        }

        let numerator: f64 = a
            .iter()
            .zip(sorted.iter())
            .map(|(ai, xi)| ai * xi)
            .sum::<f64>()
            .powi(2);

        Ok((numerator / ss_total).min(1.0))
    }

    /// p-value for W: exact transform at n = 3, log-normal approximations of
    /// Royston (1995) for 4 <= n <= 11 and n >= 12.
    fn shapiro_p_value(w: f64, n: usize) -> f64 {
        let nf = n as f64;

        if n == 3 {
            let stqr = (0.75_f64).sqrt().asin();
            let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - stqr);
            return p.clamp(0.0, 1.0);
        }

        let one_minus_w = (1.0 - w).max(f64::MIN_POSITIVE);
        let z = if n <= 11 {
            let g = -2.273 + 0.459 * nf;
            let arg = g - one_minus_w.ln();
            if arg <= 0.0 {
                // W so small the transform leaves its domain; overwhelming
                // evidence against normality.
                return 0.0;
            }
            let mu = 0.5440 - 0.39978 * nf + 0.025054 * nf * nf - 0.0006714 * nf.powi(3);
            let sigma = (1.3822 - 0.77857 * nf + 0.062767 * nf * nf - 0.0020322 * nf.powi(3)).exp();
            (-arg.ln() - mu) / sigma
        } else {
            let ln_n = nf.ln();
            let mu = -1.5861 - 0.31082 * ln_n - 0.083751 * ln_n * ln_n + 0.0038915 * ln_n.powi(3);
            let sigma = (-0.4803 - 0.082676 * ln_n + 0.0030302 * ln_n * ln_n).exp();
            (one_minus_w.ln() - mu) / sigma
        };

        // One-sided: small W (large z) is evidence against normality.
        let normal = Normal::new(0.0, 1.0).unwrap();
        (1.0 - normal.cdf(z)).clamp(0.0, 1.0)
    }
}
