//! Statistics Calculator Module
//! Handles descriptive statistics and two-sample t-tests.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Which variance assumption the two-sample t-test makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TTestKind {
    /// Pooled variance (`equal_var=True`).
    #[default]
    Student,
    /// Unequal variance with Welch-Satterthwaite degrees of freedom.
    Welch,
}

/// Mean, sample standard deviation and standard error of one set of wells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub stdev: f64,
    pub sterr: f64,
}

impl Default for SummaryStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            stdev: f64::NAN,
            sterr: f64::NAN,
        }
    }
}

/// Result of a two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTestResult {
    pub t: f64,
    pub df: f64,
    pub p_value: f64,
}

impl TTestResult {
    pub fn is_significant(&self) -> bool {
        self.p_value <= SIGNIFICANCE_THRESHOLD
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    ///
    /// Standard deviation uses `n - 1`; it and the standard error are NaN below two values.
    pub fn compute_descriptive_stats(values: &[f64]) -> SummaryStats {
        let n = values.len();
        if n == 0 {
            return SummaryStats::default();
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let (stdev, sterr) = if n > 1 {
            let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            let stdev = variance.sqrt();
            (stdev, stdev / (n as f64).sqrt())
        } else {
            (f64::NAN, f64::NAN)
        };

        SummaryStats {
            count: n,
            mean,
            stdev,
            sterr,
        }
    }

    fn mean_and_variance(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var)
    }

    /// Two-tailed p-value of `t` under a Student t distribution.
    fn two_tailed_p(t: f64, df: f64) -> Option<f64> {
        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        Some((2.0 * dist.sf(t.abs())).min(1.0))
    }

    /// p-value when the standard error vanishes.
    fn degenerate(mean1: f64, mean2: f64, df: f64) -> TTestResult {
        let (t, p_value) = if mean1 == mean2 {
            (0.0, 1.0)
        } else {
            let t = if mean1 > mean2 {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            };
            (t, 0.0)
        };
        TTestResult { t, df, p_value }
    }

    /// Perform Student's t-test (independent samples, pooled variance).
    ///
    /// Returns `None` when either side has fewer than two values.
    pub fn perform_student_ttest(group_values: &[f64], control_values: &[f64]) -> Option<TTestResult> {
        let n1 = group_values.len() as f64;
        let n2 = control_values.len() as f64;
        if n1 < 2.0 || n2 < 2.0 {
            return None;
        }

        let (mean1, var1) = Self::mean_and_variance(group_values);
        let (mean2, var2) = Self::mean_and_variance(control_values);

        let df = n1 + n2 - 2.0;
        let pooled = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / df;
        let se = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
        if se == 0.0 {
            return Some(Self::degenerate(mean1, mean2, df));
        }

        let t = (mean1 - mean2) / se;
        let p_value = Self::two_tailed_p(t, df)?;
        Some(TTestResult { t, df, p_value })
    }

    /// Perform Welch's t-test (independent samples, unequal variance).
    pub fn perform_welch_ttest(group_values: &[f64], control_values: &[f64]) -> Option<TTestResult> {
        let n1 = group_values.len() as f64;
        let n2 = control_values.len() as f64;
        if n1 < 2.0 || n2 < 2.0 {
            return None;
        }

        let (mean1, var1) = Self::mean_and_variance(group_values);
        let (mean2, var2) = Self::mean_and_variance(control_values);

        let se = (var1 / n1 + var2 / n2).sqrt();
        if se == 0.0 {
            return Some(Self::degenerate(mean1, mean2, n1 + n2 - 2.0));
        }

        let t = (mean1 - mean2) / se;

        // Welch-Satterthwaite degrees of freedom
        let df_num = (var1 / n1 + var2 / n2).powi(2);
        let df_denom = (var1 / n1).powi(2) / (n1 - 1.0) + (var2 / n2).powi(2) / (n2 - 1.0);
        let df = df_num / df_denom;

        let p_value = Self::two_tailed_p(t, df)?;
        Some(TTestResult { t, df, p_value })
    }

    /// Dispatch on the configured test kind.
    pub fn perform_ttest(
        kind: TTestKind,
        group_values: &[f64],
        control_values: &[f64],
    ) -> Option<TTestResult> {
        match kind {
            TTestKind::Student => Self::perform_student_ttest(group_values, control_values),
            TTestKind::Welch => Self::perform_welch_ttest(group_values, control_values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn descriptive_stats_use_sample_deviation() {
        let s = StatsCalculator::compute_descriptive_stats(&[10.0, 12.0, 11.5, 9.8, 10.4]);
        assert_eq!(s.count, 5);
        assert!(close(s.mean, 10.74, 1e-12));
        assert!(close(s.stdev, 0.963_327_566_303_383_5, 1e-12));
        assert!(close(s.sterr, 0.430_813_184_570_760_2, 1e-12));
    }

    #[test]
    fn single_value_has_no_spread() {
        let s = StatsCalculator::compute_descriptive_stats(&[4.0]);
        assert_eq!(s.mean, 4.0);
        assert!(s.stdev.is_nan());
        assert!(s.sterr.is_nan());
    }

    #[test]
    fn empty_input_is_all_nan() {
        let s = StatsCalculator::compute_descriptive_stats(&[]);
        assert_eq!(s.count, 0);
        assert!(s.mean.is_nan());
    }

    #[test]
    fn student_matches_reference() {
        let r = StatsCalculator::perform_student_ttest(&[1.0, 2.0, 3.0, 4.0], &[2.0, 3.0, 4.0, 5.0])
            .unwrap();
        assert!(close(r.t, -1.095_445_115_010_332, 1e-9));
        assert_eq!(r.df, 6.0);
        assert!(close(r.p_value, 0.315_333_596, 1e-5));
        assert!(!r.is_significant());
    }

    #[test]
    fn student_and_welch_differ_on_unequal_samples() {
        let a = [10.0, 12.0, 11.5, 9.8, 10.4];
        let b = [14.1, 13.0, 15.2, 12.9];

        let student = StatsCalculator::perform_ttest(TTestKind::Student, &a, &b).unwrap();
        assert!(close(student.t, -4.494_033_759_806, 1e-9));
        assert!(close(student.p_value, 0.002_818_41, 1e-5));
        assert!(student.is_significant());

        let welch = StatsCalculator::perform_ttest(TTestKind::Welch, &a, &b).unwrap();
        assert!(close(welch.t, -4.429_358_933_472, 1e-9));
        assert!(close(welch.df, 6.161_585_432_685, 1e-9));
        assert!(close(welch.p_value, 0.004_151_54, 1e-5));
    }

    #[test]
    fn sample_against_itself_is_not_significant() {
        let a = [0.9, 1.1, 1.0, 1.2];
        let r = StatsCalculator::perform_student_ttest(&a, &a).unwrap();
        assert_eq!(r.t, 0.0);
        assert!(close(r.p_value, 1.0, 1e-12));
    }

    #[test]
    fn constant_samples_are_degenerate() {
        let same = StatsCalculator::perform_student_ttest(&[2.0, 2.0], &[2.0, 2.0]).unwrap();
        assert_eq!(same.p_value, 1.0);
        let apart = StatsCalculator::perform_welch_ttest(&[3.0, 3.0], &[2.0, 2.0]).unwrap();
        assert_eq!(apart.p_value, 0.0);
        assert!(apart.t.is_infinite());
    }

    #[test]
    fn too_few_values_give_no_test() {
        assert!(StatsCalculator::perform_student_ttest(&[1.0], &[1.0, 2.0]).is_none());
        assert!(StatsCalculator::perform_welch_ttest(&[1.0, 2.0], &[]).is_none());
    }

    #[test]
    fn ttest_kind_parses_from_json() {
        let kind: TTestKind = serde_json::from_str("\"welch\"").unwrap();
        assert_eq!(kind, TTestKind::Welch);
        assert_eq!(TTestKind::default(), TTestKind::Student);
    }
}
