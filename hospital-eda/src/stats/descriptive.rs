//! Descriptive statistics over plain slices and pairwise column sums.

use serde::Serialize;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample variance with one delta degree of freedom, `None` below two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Quantile of already sorted values, interpolating linearly between ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Running sums over the complete pairs of two columns.
///
/// Filled from a single aggregate query, see
/// [`QuerySession::pair_moments`](crate::session::QuerySession::pair_moments).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PairMoments {
    pub n: u64,
    pub sum_x: f64,
    pub sum_y: f64,
    pub sum_x2: f64,
    pub sum_y2: f64,
    pub sum_xy: f64,
}

impl PairMoments {
    /// Accumulates the pairs where both values are present.
    pub fn from_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> Self {
        x.iter()
            .zip(y)
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .fold(Self::default(), |mut m, (a, b)| {
                m.n += 1;
                m.sum_x += a;
                m.sum_y += b;
                m.sum_x2 += a * a;
                m.sum_y2 += b * b;
                m.sum_xy += a * b;
                m
            })
    }

    /// Pearson correlation coefficient.
    ///
    /// `None` with fewer than two pairs or when either side is constant.
    pub fn pearson(&self) -> Option<f64> {
        if self.n < 2 {
            return None;
        }
        let n = self.n as f64;
        let sxx = n * self.sum_x2 - self.sum_x * self.sum_x;
        let syy = n * self.sum_y2 - self.sum_y * self.sum_y;
        let sxy = n * self.sum_xy - self.sum_x * self.sum_y;
        if is_negligible(sxx, n * self.sum_x2) || is_negligible(syy, n * self.sum_y2) {
            return None;
        }
        Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
    }
}

// Spread lost to cancellation in `n * sum_sq - sum^2`.
fn is_negligible(spread: f64, scale: f64) -> bool {
    spread <= scale.abs() * 1e-12
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value within 1.5 IQR below Q1
    pub lower_whisker: f64,
    /// Largest value within 1.5 IQR above Q3
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
    pub count: usize,
}

impl BoxStats {
    /// Computes box statistics, `None` for no values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let fence = 1.5 * (q3 - q1);
        let (low_fence, high_fence) = (q1 - fence, q3 + fence);

        let inside = sorted.iter().copied().filter(|v| (low_fence..=high_fence).contains(v));
        let lower_whisker = inside.clone().next().unwrap_or(q1);
        let upper_whisker = inside.last().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| !(low_fence..=high_fence).contains(v))
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
            count: sorted.len(),
        })
    }
}
