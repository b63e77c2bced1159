//! Dixon's Q-test for small-sample outlier detection
//!
//! The Q statistic compares the gap between an extreme value and its nearest
//! neighbour to the full range of the sample. A value is flagged when its Q
//! exceeds the tabulated critical value for the sample size and confidence
//! level. Critical values are tabulated for n = 3..=30.
//!
//! # Example
//! ```
//! use assay::dixon::dixon_test;
//!
//! let outcome = dixon_test(&[1.0, 5.0, 1.0], true, true, 95).unwrap();
//! assert_eq!(outcome.outliers, vec![5.0]);
//! assert_eq!(outcome.indices, vec![1]);
//! assert_eq!(outcome.residual, vec![1.0, 1.0]);
//! ```

use crate::error::{OutlierError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest sample the Q-test is defined for
pub const MIN_SAMPLE_SIZE: usize = 3;

/// Largest sample with tabulated critical values
pub const MAX_SAMPLE_SIZE: usize = 30;

const TABLE_LEN: usize = MAX_SAMPLE_SIZE - MIN_SAMPLE_SIZE + 1;

const Q90: [f64; TABLE_LEN] = [
    0.941, 0.765, 0.642, 0.56, 0.507, 0.468, 0.437, 0.412, 0.392, 0.376, 0.361, 0.349, 0.338,
    0.329, 0.32, 0.313, 0.306, 0.3, 0.295, 0.29, 0.285, 0.281, 0.277, 0.273, 0.269, 0.266, 0.263,
    0.26,
];

const Q95: [f64; TABLE_LEN] = [
    0.97, 0.829, 0.71, 0.625, 0.568, 0.526, 0.493, 0.466, 0.444, 0.426, 0.41, 0.396, 0.384,
    0.374, 0.365, 0.356, 0.349, 0.342, 0.337, 0.331, 0.326, 0.321, 0.317, 0.312, 0.308, 0.305,
    0.301, 0.29,
];

const Q99: [f64; TABLE_LEN] = [
    0.994, 0.926, 0.821, 0.74, 0.68, 0.634, 0.598, 0.568, 0.542, 0.522, 0.503, 0.488, 0.475,
    0.463, 0.452, 0.442, 0.433, 0.425, 0.418, 0.411, 0.404, 0.399, 0.393, 0.388, 0.384, 0.38,
    0.376, 0.372,
];

/// Confidence level selecting the critical-Q table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ConfidenceLevel {
    /// 90% confidence
    P90,
    /// 95% confidence (default)
    #[default]
    P95,
    /// 99% confidence
    P99,
}

impl ConfidenceLevel {
    /// Confidence level as a whole percentage
    pub fn percent(self) -> u32 {
        match self {
            ConfidenceLevel::P90 => 90,
            ConfidenceLevel::P95 => 95,
            ConfidenceLevel::P99 => 99,
        }
    }

    fn table(self) -> &'static [f64; TABLE_LEN] {
        match self {
            ConfidenceLevel::P90 => &Q90,
            ConfidenceLevel::P95 => &Q95,
            ConfidenceLevel::P99 => &Q99,
        }
    }

    /// Critical Q value for a sample of `n` points
    pub fn critical_q(self, n: usize) -> Result<f64> {
        if n < MIN_SAMPLE_SIZE {
            return Err(OutlierError::InsufficientData {
                required: MIN_SAMPLE_SIZE,
                got: n,
            });
        }
        if n > MAX_SAMPLE_SIZE {
            return Err(OutlierError::UnsupportedSampleSize {
                size: n,
                max: MAX_SAMPLE_SIZE,
            });
        }
        Ok(self.table()[n - MIN_SAMPLE_SIZE])
    }
}

impl TryFrom<u32> for ConfidenceLevel {
    type Error = OutlierError;

    fn try_from(percent: u32) -> Result<Self> {
        match percent {
            90 => Ok(ConfidenceLevel::P90),
            95 => Ok(ConfidenceLevel::P95),
            99 => Ok(ConfidenceLevel::P99),
            other => Err(OutlierError::InvalidConfidenceLevel(other)),
        }
    }
}

impl From<ConfidenceLevel> for u32 {
    fn from(level: ConfidenceLevel) -> Self {
        level.percent()
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Result of a Q-test over one sample
#[derive(Debug, Clone, PartialEq)]
pub struct DixonOutcome {
    /// Input values with the flagged points removed, original order kept
    pub residual: Vec<f64>,
    /// Flagged values (minimum first, then maximum)
    pub outliers: Vec<f64>,
    /// Original indices of the flagged values, same order as `outliers`
    pub indices: Vec<usize>,
}

impl DixonOutcome {
    fn split(data: &[f64], indices: Vec<usize>) -> Self {
        let residual = data
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, &v)| v)
            .collect();
        let outliers = indices.iter().map(|&i| data[i]).collect();

        Self {
            residual,
            outliers,
            indices,
        }
    }

    /// Whether any point was flagged
    pub fn has_outliers(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Whether the point at `index` of the input was flagged
    pub fn is_flagged(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }
}

/// Run Dixon's Q-test over `data`
///
/// # Arguments
/// * `data` - Ordered or unordered sample; NaN entries never become outliers
///   but still count toward the sample size used for the critical value
/// * `left` - Test the minimum value
/// * `right` - Test the maximum value
/// * `confidence_level` - One of 90, 95, 99
///
/// # Errors
/// `InvalidTestSelection` when both tails are disabled, `InsufficientData`
/// below 3 points, `InvalidConfidenceLevel` for untabulated levels and
/// `UnsupportedSampleSize` above 30 points.
pub fn dixon_test(
    data: &[f64],
    left: bool,
    right: bool,
    confidence_level: u32,
) -> Result<DixonOutcome> {
    if !left && !right {
        return Err(OutlierError::InvalidTestSelection);
    }
    if data.len() < MIN_SAMPLE_SIZE {
        return Err(OutlierError::InsufficientData {
            required: MIN_SAMPLE_SIZE,
            got: data.len(),
        });
    }
    let level = ConfidenceLevel::try_from(confidence_level)?;
    let critical = level.critical_q(data.len())?;

    let indices = flag_extremes(data, left, right, critical);
    Ok(DixonOutcome::split(data, indices))
}

/// Gap-over-range ratio; a zero range carries no excess
fn q_ratio(gap: f64, range: f64) -> f64 {
    if range == 0.0 {
        0.0
    } else {
        gap / range
    }
}

/// Half the distance between two finite values; halving first keeps spans
/// near `f64::MAX` finite
fn half_span(a: f64, b: f64) -> f64 {
    (a / 2.0 - b / 2.0).abs()
}

fn flag_extremes(data: &[f64], left: bool, right: bool, critical: f64) -> Vec<usize> {
    // Stable sort of the finite values, keeping their original positions
    let mut sorted: Vec<(usize, f64)> = data
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .collect();
    if sorted.len() < MIN_SAMPLE_SIZE {
        return Vec::new();
    }
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    let last = sorted.len() - 1;
    let (min_index, min_value) = sorted[0];
    let (max_index, max_value) = sorted[last];

    let min_margin = if left {
        q_ratio(half_span(sorted[1].1, min_value), half_span(max_value, min_value)) - critical
    } else {
        0.0
    };
    let max_margin = if right {
        q_ratio(
            half_span(max_value, sorted[last - 1].1),
            half_span(max_value, min_value),
        ) - critical
    } else {
        0.0
    };

    if min_margin <= 0.0 && max_margin <= 0.0 {
        Vec::new()
    } else if min_margin == max_margin {
        vec![min_index, max_index]
    } else if min_margin > max_margin {
        vec![min_index]
    } else {
        vec![max_index]
    }
}
