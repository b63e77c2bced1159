//! Per-element descriptive statistics
//!
//! Mean, spread and extremes come from trueno's SIMD vector primitives; the
//! median uses aprender's `DescriptiveStats` quantile (R-7 method).

use crate::dataset::Dataset;
use crate::error::Result;
use aprender::stats::DescriptiveStats;
use serde::Serialize;
use trueno::Vector;

/// Statistics for one element column, computed over finite values only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSummary {
    pub element: String,
    /// Finite readings
    pub count: usize,
    /// Missing (NaN) readings
    pub missing: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
}

/// Summarize each element column of `dataset`
pub fn summarize<S: AsRef<str>>(dataset: &Dataset, elements: &[S]) -> Result<Vec<ElementSummary>> {
    elements
        .iter()
        .map(|element| {
            let element = element.as_ref();
            let column = dataset.column(element)?;
            let finite: Vec<f32> = column
                .iter()
                .filter(|v| v.is_finite())
                .map(|&v| v as f32)
                .collect();
            Ok(summarize_values(element, &finite, column.len() - finite.len()))
        })
        .collect()
}

fn summarize_values(element: &str, finite: &[f32], missing: usize) -> ElementSummary {
    if finite.is_empty() {
        return ElementSummary {
            element: element.to_string(),
            count: 0,
            missing,
            mean: None,
            stddev: None,
            min: None,
            max: None,
            median: None,
        };
    }

    let v = Vector::from_slice(finite);
    let median = DescriptiveStats::new(&v).quantile(0.5).ok();

    ElementSummary {
        element: element.to_string(),
        count: finite.len(),
        missing,
        mean: v.mean().ok().map(f64::from),
        stddev: v.stddev().ok().map(f64::from),
        min: v.min().ok().map(f64::from),
        max: v.max().ok().map(f64::from),
        median: median.map(f64::from),
    }
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

/// Print a summary table to stderr
pub fn print_summary(summaries: &[ElementSummary]) {
    if summaries.is_empty() {
        eprintln!("No element columns to summarize.");
        return;
    }

    eprintln!(
        "{:<8} {:>7} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "element", "count", "missing", "mean", "stddev", "min", "median", "max"
    );
    eprintln!("{}", "-".repeat(90));
    for s in summaries {
        eprintln!(
            "{:<8} {:>7} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12}",
            s.element,
            s.count,
            s.missing,
            fmt_stat(s.mean),
            fmt_stat(s.stddev),
            fmt_stat(s.min),
            fmt_stat(s.median),
            fmt_stat(s.max),
        );
    }
}
