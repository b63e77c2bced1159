//! Outlier reconciliation
//!
//! Drives the Q-test over every element column of a dataset, turns flagged
//! rows into `sample_session_element` records, merges records into the
//! persisted store, and applies a store back onto a dataset.

use crate::config::{DetectionConfig, DetectionMode};
use crate::dataset::{Dataset, Sample};
use crate::dixon::dixon_test;
use crate::error::Result;
use crate::records::{OutlierRecord, SampleId};
use crate::store::OutlierStore;
use crate::window::WindowedDixon;
use std::path::Path;
use tracing::{debug, info, warn};

/// Detect outliers at 95% confidence, both tails, whole column at once
///
/// Records are emitted element by element (in the order given), then in row
/// order within each element.
pub fn detect<S: AsRef<str>>(elements: &[S], dataset: &Dataset) -> Result<Vec<OutlierRecord>> {
    detect_with(elements, dataset, &DetectionConfig::default())
}

/// Detect outliers with an explicit configuration
pub fn detect_with<S: AsRef<str>>(
    elements: &[S],
    dataset: &Dataset,
    config: &DetectionConfig,
) -> Result<Vec<OutlierRecord>> {
    config.validate()?;

    let mut records = Vec::new();
    for element in elements {
        let element = element.as_ref();
        let column = dataset.column(element)?;

        let flagged = match config.mode {
            DetectionMode::Batch => flag_batch(&column, config)?,
            DetectionMode::Windowed { buffer_samples } => {
                flag_windowed(&column, buffer_samples, config)?
            }
        };

        debug!(
            element,
            rows = column.len(),
            flagged = flagged.len(),
            "screened element column"
        );

        let rows = dataset.rows();
        records.extend(flagged.into_iter().map(|row| {
            let sample = &rows[row];
            OutlierRecord::sample_session_element(
                sample.sample_id.clone(),
                sample.date.clone(),
                element,
            )
        }));
    }

    info!(
        elements = elements.len(),
        rows = dataset.len(),
        outliers = records.len(),
        confidence = config.confidence_level,
        "outlier detection complete"
    );
    Ok(records)
}

/// Row indices flagged when the whole column is tested at once
fn flag_batch(column: &[f64], config: &DetectionConfig) -> Result<Vec<usize>> {
    let outcome = dixon_test(column, config.left, config.right, config.confidence_level)?;
    let mut rows = outcome.indices;
    rows.sort_unstable();
    Ok(rows)
}

/// Row indices flagged by a sliding-window detector fed in row order
fn flag_windowed(
    column: &[f64],
    buffer_samples: usize,
    config: &DetectionConfig,
) -> Result<Vec<usize>> {
    let mut detector = WindowedDixon::from_config(buffer_samples, config)?;
    let mut rows = Vec::new();
    for (row, &value) in column.iter().enumerate() {
        if detector.is_outlier(value)? {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Load the store at `path`, merge `records` into it and rewrite it
///
/// Returns the number of records that were not already stored. An empty
/// batch leaves the file untouched.
pub fn save_outliers(records: Vec<OutlierRecord>, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut store = OutlierStore::load(path)?;
    if records.is_empty() {
        debug!(path = %path.display(), "no outlier records to save");
        return Ok(0);
    }
    let added = store.merge(records)?;
    store.save(path)?;
    Ok(added)
}

/// Counts of what [`apply_in_place`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Rows removed by `sample` records
    pub sample_rows_deleted: usize,
    /// Rows removed by `sample_session` records
    pub session_rows_deleted: usize,
    /// Cells set to missing by `sample_session_element` records
    pub cells_nulled: usize,
    /// `sample_session_element` records naming an element the dataset lacks
    pub records_skipped: usize,
}

impl ApplySummary {
    pub fn rows_deleted(&self) -> usize {
        self.sample_rows_deleted + self.session_rows_deleted
    }
}

/// Return a copy of `dataset` with every stored outlier excluded
pub fn apply(store: &OutlierStore, dataset: &Dataset) -> Dataset {
    let mut cleaned = dataset.clone();
    apply_in_place(store, &mut cleaned);
    cleaned
}

/// Exclude stored outliers from `dataset`
///
/// Runs three passes in a fixed order: delete rows by sample, delete rows by
/// sample and session, then null single readings. Earlier passes remove rows
/// the last pass would otherwise touch.
pub fn apply_in_place(store: &OutlierStore, dataset: &mut Dataset) -> ApplySummary {
    let mut summary = ApplySummary::default();

    for record in &store.sample {
        let sample_id = record.sample_id();
        summary.sample_rows_deleted += dataset.retain_rows(|s| s.sample_id != *sample_id);
    }
    debug!(
        records = store.sample.len(),
        rows = summary.sample_rows_deleted,
        "deleted outlier samples"
    );

    for record in &store.sample_session {
        if let Some(session) = record.session() {
            let sample_id = record.sample_id();
            summary.session_rows_deleted +=
                dataset.retain_rows(|s| !matches_session(s, sample_id, session));
        }
    }
    debug!(
        records = store.sample_session.len(),
        rows = summary.session_rows_deleted,
        "deleted outlier sessions"
    );

    for record in &store.sample_session_element {
        let (Some(session), Some(element)) = (record.session(), record.element()) else {
            continue;
        };
        let Ok(index) = dataset.element_index(element) else {
            warn!(element, record = %record, "stored outlier names an element not in the dataset");
            summary.records_skipped += 1;
            continue;
        };
        let sample_id = record.sample_id();
        summary.cells_nulled +=
            dataset.null_where(index, |s| matches_session(s, sample_id, session));
    }
    debug!(
        records = store.sample_session_element.len(),
        cells = summary.cells_nulled,
        skipped = summary.records_skipped,
        "nulled outlier readings"
    );

    info!(
        rows_deleted = summary.rows_deleted(),
        cells_nulled = summary.cells_nulled,
        rows_left = dataset.len(),
        "applied outlier store"
    );
    summary
}

fn matches_session(sample: &Sample, sample_id: &SampleId, session: &str) -> bool {
    sample.sample_id == *sample_id && sample.date == session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OutlierError;

    fn dataset() -> Dataset {
        let mut data = Dataset::new(["Fe", "Cu"]);
        data.push(1, "d1", vec![10.0, 2.0]).unwrap();
        data.push(2, "d1", vec![10.1, 2.1]).unwrap();
        data.push(3, "d1", vec![9.9, 2.0]).unwrap();
        data.push(4, "d2", vec![10.0, 2.2]).unwrap();
        data.push(5, "d2", vec![55.0, 2.1]).unwrap();
        data
    }

    #[test]
    fn test_detect_flags_spike() {
        let records = detect(&["Fe", "Cu"], &dataset()).unwrap();
        assert_eq!(
            records,
            vec![OutlierRecord::sample_session_element(5, "d2", "Fe")]
        );
    }

    #[test]
    fn test_detect_orders_by_element_then_row() {
        let mut data = Dataset::new(["Fe", "Cu"]);
        data.push(1, "d1", vec![-40.0, 2.0]).unwrap();
        data.push(2, "d1", vec![10.1, 2.1]).unwrap();
        data.push(3, "d1", vec![9.9, 2.0]).unwrap();
        data.push(4, "d1", vec![10.0, 2.05]).unwrap();
        data.push(5, "d1", vec![10.0, 2.1]).unwrap();
        data.push(6, "d1", vec![10.05, 30.0]).unwrap();

        let records = detect(&["Cu", "Fe"], &data).unwrap();
        assert_eq!(
            records,
            vec![
                OutlierRecord::sample_session_element(6, "d1", "Cu"),
                OutlierRecord::sample_session_element(1, "d1", "Fe"),
            ]
        );
    }

    #[test]
    fn test_detect_unknown_element() {
        let err = detect(&["Zn"], &dataset()).unwrap_err();
        assert!(matches!(err, OutlierError::UnknownColumn(ref c) if c == "Zn"));
    }

    #[test]
    fn test_detect_too_few_rows() {
        let mut data = Dataset::new(["Fe"]);
        data.push(1, "d1", vec![1.0]).unwrap();
        let err = detect(&["Fe"], &data).unwrap_err();
        assert!(matches!(err, OutlierError::InsufficientData { got: 1, .. }));
    }

    #[test]
    fn test_detect_windowed_handles_long_columns() {
        let mut data = Dataset::new(["Fe"]);
        for i in 0..40 {
            let value = if i == 35 { 500.0 } else { 10.0 + (i % 3) as f64 * 0.1 };
            data.push(i, "d1", vec![value]).unwrap();
        }
        assert!(matches!(
            detect(&["Fe"], &data),
            Err(OutlierError::UnsupportedSampleSize { size: 40, .. })
        ));

        let config = DetectionConfig::default().windowed(27);
        let records = detect_with(&["Fe"], &data, &config).unwrap();
        assert_eq!(
            records,
            vec![OutlierRecord::sample_session_element(35, "d1", "Fe")]
        );
    }

    #[test]
    fn test_apply_pass_order() {
        let mut store = OutlierStore::new();
        store.merge(vec![OutlierRecord::sample(1)]).unwrap();
        store
            .merge(vec![OutlierRecord::sample_session(4, "d2")])
            .unwrap();
        store
            .merge(vec![
                OutlierRecord::sample_session_element(1, "d1", "Fe"),
                OutlierRecord::sample_session_element(5, "d2", "Fe"),
            ])
            .unwrap();

        let mut data = dataset();
        let summary = apply_in_place(&store, &mut data);
        assert_eq!(summary.sample_rows_deleted, 1);
        assert_eq!(summary.session_rows_deleted, 1);
        // Sample 1 is already gone, so only sample 5 is nulled
        assert_eq!(summary.cells_nulled, 1);
        assert_eq!(data.len(), 3);
        assert!(data.value(2, "Fe").unwrap().is_nan());
        assert_eq!(data.value(2, "Cu"), Some(2.1));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut store = OutlierStore::new();
        store.merge(vec![OutlierRecord::sample(2)]).unwrap();
        store
            .merge(vec![OutlierRecord::sample_session_element(5, "d2", "Fe")])
            .unwrap();

        let once = apply(&store, &dataset());
        let twice = apply(&store, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_unknown_element_is_skipped() {
        let mut store = OutlierStore::new();
        store
            .merge(vec![OutlierRecord::sample_session_element(1, "d1", "Zn")])
            .unwrap();
        let data = dataset();
        assert_eq!(apply(&store, &data), data);

        let mut cleaned = data.clone();
        let summary = apply_in_place(&store, &mut cleaned);
        assert_eq!(summary.records_skipped, 1);
        assert_eq!(summary.cells_nulled, 0);
    }
}
