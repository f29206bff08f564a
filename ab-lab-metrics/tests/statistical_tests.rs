use ab_lab_core::{CoreError, GroupLabel, Sample};
use ab_lab_metrics::statistical::StatisticalTests;
use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{ContinuousCDF, Normal};

const ALPHA: f64 = 0.05;

fn sample(label: GroupLabel, values: &[f64]) -> Sample {
    Sample::new(label, values.to_vec()).unwrap()
}

/// Purchase column of the reference experiment, truncated to 5 rows per group.
fn purchase_control() -> Sample {
    sample(
        GroupLabel::Control,
        &[82529.459, 98050.452, 82696.024, 109914.400, 108457.763],
    )
}

fn purchase_test() -> Sample {
    sample(
        GroupLabel::Test,
        &[702.160, 834.054, 422.934, 429.034, 749.860],
    )
}

// ===== Shapiro-Wilk =====

#[test]
fn test_shapiro_wilk_purchase_groups() {
    let control = StatisticalTests::shapiro_wilk(&purchase_control(), ALPHA).unwrap();
    assert_relative_eq!(control.statistic, 0.8387536, max_relative = 1e-4);
    assert_relative_eq!(control.p_value, 0.1615059, max_relative = 1e-3);
    assert!(!control.reject_null);

    let test = StatisticalTests::shapiro_wilk(&purchase_test(), ALPHA).unwrap();
    assert_relative_eq!(test.statistic, 0.8513680, max_relative = 1e-4);
    assert_relative_eq!(test.p_value, 0.1988815, max_relative = 1e-3);
    assert!(!test.reject_null);
}

#[test]
fn test_shapiro_wilk_evenly_spaced() {
    let s = sample(
        GroupLabel::Control,
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
    );
    let result = StatisticalTests::shapiro_wilk(&s, ALPHA).unwrap();
    assert_relative_eq!(result.statistic, 0.9748583, max_relative = 1e-4);
    assert_relative_eq!(result.p_value, 0.9331652, max_relative = 1e-3);
}

#[test]
fn test_shapiro_wilk_rejects_heavy_outlier() {
    let skewed = sample(
        GroupLabel::Test,
        &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 20.0],
    );
    let result = StatisticalTests::shapiro_wilk(&skewed, ALPHA).unwrap();
    assert_relative_eq!(result.statistic, 0.3657206, max_relative = 1e-4);
    assert!(result.p_value < 1e-5);
    assert!(result.reject_null);
}

#[test]
fn test_shapiro_wilk_accepts_normal_scores() {
    // Exact normal order statistics at n = 40: as normal as data gets.
    let normal = Normal::new(50.0, 2.0).unwrap();
    let values: Vec<f64> = (0..40)
        .map(|i| normal.inverse_cdf((i as f64 + 0.5) / 40.0))
        .collect();

    let s = Sample::new(GroupLabel::Control, values).unwrap();
    let result = StatisticalTests::shapiro_wilk(&s, ALPHA).unwrap();
    assert!(result.statistic > 0.998);
    assert!(result.p_value > 0.99);
    assert!(!result.reject_null);
}

#[test]
fn test_shapiro_wilk_seeded_normal_draws() {
    let mut rng = StdRng::seed_from_u64(42);
    let normal = Normal::new(100.0, 15.0).unwrap();
    let values: Vec<f64> = (0..50)
        .map(|_| normal.inverse_cdf(rng.gen_range(1e-9..1.0 - 1e-9)))
        .collect();

    let s = Sample::new(GroupLabel::Control, values).unwrap();
    let result = StatisticalTests::shapiro_wilk(&s, ALPHA).unwrap();
    assert!(result.statistic > 0.0 && result.statistic <= 1.0);
    // True normal draws: p below this only for ~0.1% of seeds.
    assert!(result.p_value > 0.001, "p = {}", result.p_value);
}

#[test]
fn test_shapiro_wilk_minimum_length() {
    let tiny = sample(GroupLabel::Control, &[1.0]);
    match StatisticalTests::shapiro_wilk(&tiny, ALPHA).unwrap_err() {
        CoreError::InsufficientData {
            group,
            required,
            actual,
            ..
        } => {
            assert_eq!(group, GroupLabel::Control);
            assert_eq!(required, 3);
            assert_eq!(actual, 1);
        }
        other => panic!("expected InsufficientData, got {other:?}"),
    }

    // n = 3 is the smallest supported sample
    let three = sample(GroupLabel::Test, &[1.0, 2.0, 4.0]);
    assert!(StatisticalTests::shapiro_wilk(&three, ALPHA).is_ok());
}

#[test]
fn test_shapiro_wilk_maximum_length() {
    let values: Vec<f64> = (0..5001).map(|i| i as f64).collect();
    let oversized = Sample::new(GroupLabel::Control, values).unwrap();
    match StatisticalTests::shapiro_wilk(&oversized, ALPHA).unwrap_err() {
        CoreError::Validation(message) => {
            assert!(message.contains("5000"), "unexpected message: {message}");
        }
        other => panic!("expected Validation, got {other:?}"),
    }

    // n = 5000 is still in range
    let values: Vec<f64> = (0..5000).map(|i| i as f64).collect();
    let at_limit = Sample::new(GroupLabel::Test, values).unwrap();
    assert!(StatisticalTests::shapiro_wilk(&at_limit, ALPHA).is_ok());
}

#[test]
fn test_shapiro_wilk_constant_sample() {
    let flat = sample(GroupLabel::Test, &[5.0, 5.0, 5.0, 5.0]);
    match StatisticalTests::shapiro_wilk(&flat, ALPHA).unwrap_err() {
        CoreError::DegenerateVariance { group } => assert_eq!(group, GroupLabel::Test),
        other => panic!("expected DegenerateVariance, got {other:?}"),
    }
}

// ===== Levene (Brown-Forsythe) =====

#[test]
fn test_levene_purchase_groups() {
    let result =
        StatisticalTests::levene(&purchase_control(), &purchase_test(), ALPHA).unwrap();
    assert_relative_eq!(result.statistic, 13.6617038, max_relative = 1e-6);
    assert_relative_eq!(result.p_value, 0.0060760, max_relative = 1e-4);
    assert!(result.reject_null);
}

#[test]
fn test_levene_same_distribution() {
    let g1 = sample(
        GroupLabel::Control,
        &[5.1, 4.9, 5.2, 5.0, 4.8, 5.3, 5.1, 4.9, 5.0, 5.2],
    );
    let g2 = sample(
        GroupLabel::Test,
        &[5.0, 5.2, 4.9, 5.1, 5.3, 4.8, 5.0, 5.1, 4.9, 5.2],
    );
    let result = StatisticalTests::levene(&g1, &g2, ALPHA).unwrap();
    assert!(!result.reject_null);
    assert!(result.p_value > 0.5);
}

#[test]
fn test_levene_clearly_unequal_spread() {
    let tight = sample(
        GroupLabel::Control,
        &[9.8, 9.9, 10.0, 10.1, 10.2, 9.85, 10.15, 9.95, 10.05, 10.1],
    );
    let wide = sample(
        GroupLabel::Test,
        &[4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 5.0, 9.0, 15.0],
    );
    let result = StatisticalTests::levene(&tight, &wide, ALPHA).unwrap();
    assert_relative_eq!(result.statistic, 24.6023513, max_relative = 1e-6);
    assert_relative_eq!(result.p_value, 0.000101228, max_relative = 1e-4);
    assert!(result.reject_null);
}

#[test]
fn test_levene_minimum_length() {
    let short = sample(GroupLabel::Control, &[1.0]);
    let ok = sample(GroupLabel::Test, &[1.0, 2.0, 3.0]);
    assert!(matches!(
        StatisticalTests::levene(&short, &ok, ALPHA),
        Err(CoreError::InsufficientData { .. })
    ));
}

// ===== t-tests =====

#[test]
fn test_t_test_equal_var_purchase_groups() {
    let result =
        StatisticalTests::t_test_equal_var(&purchase_control(), &purchase_test(), ALPHA).unwrap();
    assert_relative_eq!(result.statistic, 16.0502560, max_relative = 1e-6);
    assert_relative_eq!(result.p_value, 2.2779075e-7, max_relative = 1e-4);
    assert!(result.reject_null);
}

#[test]
fn test_t_test_welch_purchase_groups() {
    let result =
        StatisticalTests::t_test_welch(&purchase_control(), &purchase_test(), ALPHA).unwrap();
    // Equal group sizes: same t as the pooled test, very different df and p.
    assert_relative_eq!(result.statistic, 16.0502560, max_relative = 1e-6);
    assert_relative_eq!(result.p_value, 8.7874502e-5, max_relative = 1e-4);
    assert!(result.reject_null);
}

#[test]
fn test_t_test_welch_equal_means_unequal_variance() {
    let tight = sample(
        GroupLabel::Control,
        &[9.8, 9.9, 10.0, 10.1, 10.2, 9.85, 10.15, 9.95, 10.05, 10.1],
    );
    let wide = sample(
        GroupLabel::Test,
        &[4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 5.0, 9.0, 15.0],
    );
    let result = StatisticalTests::t_test_welch(&tight, &wide, ALPHA).unwrap();
    assert_relative_eq!(result.statistic, 0.0817225, max_relative = 1e-5);
    assert_relative_eq!(result.p_value, 0.9366526, max_relative = 1e-4);
    assert!(!result.reject_null);
}

#[test]
fn test_t_test_identical_samples() {
    let g1 = sample(GroupLabel::Control, &[10.0, 11.0, 12.0, 13.0, 14.0]);
    let g2 = sample(GroupLabel::Test, &[10.0, 11.0, 12.0, 13.0, 14.0]);
    let result = StatisticalTests::t_test_equal_var(&g1, &g2, ALPHA).unwrap();
    assert!(result.statistic.abs() < 1e-12);
    assert!(result.p_value > 0.999);
    assert!(!result.reject_null);
}

#[test]
fn test_t_test_insufficient_data() {
    let single = sample(GroupLabel::Control, &[10.0]);
    let ok = sample(GroupLabel::Test, &[1.0, 2.0, 3.0]);
    assert!(matches!(
        StatisticalTests::t_test_equal_var(&single, &ok, ALPHA),
        Err(CoreError::InsufficientData { .. })
    ));
    assert!(matches!(
        StatisticalTests::t_test_welch(&ok, &single, ALPHA),
        Err(CoreError::InsufficientData { .. })
    ));
}

#[test]
fn test_t_test_degenerate_variance() {
    let flat = sample(GroupLabel::Control, &[5.0, 5.0, 5.0, 5.0]);
    let ok = sample(GroupLabel::Test, &[1.0, 2.0, 3.0]);
    match StatisticalTests::t_test_welch(&flat, &ok, ALPHA).unwrap_err() {
        CoreError::DegenerateVariance { group } => assert_eq!(group, GroupLabel::Control),
        other => panic!("expected DegenerateVariance, got {other:?}"),
    }
}

// ===== Mann-Whitney U =====

#[test]
fn test_mann_whitney_u_skewed_vs_shifted() {
    let skewed = sample(
        GroupLabel::Control,
        &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 20.0],
    );
    let shifted = sample(
        GroupLabel::Test,
        &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0],
    );
    let result = StatisticalTests::mann_whitney_u(&skewed, &shifted, ALPHA).unwrap();
    assert_relative_eq!(result.statistic, 10.0, max_relative = 1e-12);
    assert_relative_eq!(result.p_value, 0.0015238, max_relative = 1e-3);
    assert!(result.reject_null);
}

#[test]
fn test_mann_whitney_u_disjoint_groups() {
    let result =
        StatisticalTests::mann_whitney_u(&purchase_control(), &purchase_test(), ALPHA).unwrap();
    // No overlap at all: U = 0.
    assert_eq!(result.statistic, 0.0);
    assert_relative_eq!(result.p_value, 0.0090234, max_relative = 1e-3);
    assert!(result.reject_null);
}

#[test]
fn test_mann_whitney_u_identical_samples() {
    let g1 = sample(GroupLabel::Control, &[1.0, 2.0, 3.0, 4.0, 5.0]);
    let g2 = sample(GroupLabel::Test, &[1.0, 2.0, 3.0, 4.0, 5.0]);
    let result = StatisticalTests::mann_whitney_u(&g1, &g2, ALPHA).unwrap();
    assert_eq!(result.statistic, 12.5);
    assert!(result.p_value > 0.999);
    assert!(!result.reject_null);
}

#[test]
fn test_mann_whitney_u_all_tied() {
    let g1 = sample(GroupLabel::Control, &[3.0, 3.0, 3.0]);
    let g2 = sample(GroupLabel::Test, &[3.0, 3.0, 3.0]);
    let result = StatisticalTests::mann_whitney_u(&g1, &g2, ALPHA).unwrap();
    assert_eq!(result.p_value, 1.0);
    assert!(!result.reject_null);
}
