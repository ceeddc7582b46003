//! Welch's two-sample t-test.

use serde::Serialize;
use tracing::{info, instrument};

use super::descriptive::{mean, sample_variance};
use super::distributions::student_t_two_sided_p;
use crate::columns;
use crate::error::{EdaError, Result};
use crate::table::Table;

/// Name used in failure messages and reports.
pub const T_TEST_NAME: &str = "T-test";

/// Outcome of [`welch_t_test`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TTestResult {
    pub statistic: f64,
    pub p_value: f64,
    /// Welch-Satterthwaite degrees of freedom
    pub df: f64,
    pub mean_a: f64,
    pub mean_b: f64,
    pub n_a: usize,
    pub n_b: usize,
}

impl TTestResult {
    /// Whether the difference is significant at `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Compares the means of two independent samples without assuming equal variances.
///
/// # Errors
///
/// [`EdaError::InsufficientData`] when a group has fewer than two
/// observations or the standard error of the difference is zero.
#[instrument(skip_all, fields(n_a = a.len(), n_b = b.len()))]
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TTestResult> {
    for (label, group) in [("first", a), ("second", b)] {
        if group.is_empty() {
            return Err(EdaError::insufficient_data(
                T_TEST_NAME,
                format!("{label} group is empty"),
            ));
        }
        if group.len() < 2 {
            return Err(EdaError::insufficient_data(
                T_TEST_NAME,
                format!("{label} group has a single observation"),
            ));
        }
    }

    let (mean_a, mean_b) = match (mean(a), mean(b)) {
        (Some(ma), Some(mb)) => (ma, mb),
        _ => return Err(EdaError::Internal("mean of non-empty group".to_string())),
    };
    let (var_a, var_b) = match (sample_variance(a), sample_variance(b)) {
        (Some(va), Some(vb)) => (va, vb),
        _ => return Err(EdaError::Internal("variance of group with n >= 2".to_string())),
    };

    let se_a = var_a / a.len() as f64;
    let se_b = var_b / b.len() as f64;
    let se = (se_a + se_b).sqrt();
    if se == 0.0 || !se.is_finite() {
        return Err(EdaError::insufficient_data(
            T_TEST_NAME,
            "both groups have zero variance",
        ));
    }

    let statistic = (mean_a - mean_b) / se;
    let df = (se_a + se_b).powi(2)
        / (se_a.powi(2) / (a.len() - 1) as f64 + se_b.powi(2) / (b.len() - 1) as f64);
    let p_value = student_t_two_sided_p(statistic, df);

    info!(statistic, p_value, df, "computed Welch t-test");
    Ok(TTestResult {
        statistic,
        p_value,
        df,
        mean_a,
        mean_b,
        n_a: a.len(),
        n_b: b.len(),
    })
}

/// Ratings split by whether the hospital offers emergency services.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingGroups {
    /// Ratings of hospitals with `Emergency Services == "Yes"`
    pub emergency: Vec<f64>,
    /// Ratings of hospitals with `Emergency Services == "No"`
    pub non_emergency: Vec<f64>,
}

/// Extracts the two rating groups.
///
/// Rows missing the rating or the emergency flag are skipped, as are flags
/// other than `Yes`/`No`. A textual rating column is coerced first.
pub fn rating_groups(table: &Table) -> Result<RatingGroups> {
    let (table, _) = table.coerce_numeric(columns::OVERALL_RATING)?;
    let rating = table.require_column(columns::OVERALL_RATING)?.data();
    let emergency = table.require_column(columns::EMERGENCY_SERVICES)?.data();

    let mut groups = RatingGroups::default();
    for row in 0..table.num_rows() {
        let Some(value) = rating.f64_value(row) else {
            continue;
        };
        match emergency.str_value(row) {
            Some(columns::YES) => groups.emergency.push(value),
            Some(columns::NO) => groups.non_emergency.push(value),
            _ => {}
        }
    }
    Ok(groups)
}

/// Runs [`welch_t_test`] on the emergency and non-emergency rating groups.
pub fn emergency_rating_t_test(table: &Table) -> Result<TTestResult> {
    let groups = rating_groups(table)?;
    welch_t_test(&groups.emergency, &groups.non_emergency)
}
