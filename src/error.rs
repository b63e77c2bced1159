//! Error types for outlier detection and reconciliation

use crate::records::RecordShape;
use thiserror::Error;

/// Errors raised by the detector, the reconciler and the outlier store
#[derive(Error, Debug)]
pub enum OutlierError {
    #[error("Invalid confidence level: {0} (critical values are tabulated for 90, 95 and 99)")]
    InvalidConfidenceLevel(u32),

    #[error("Invalid test selection: at least one of `left` or `right` must be enabled")]
    InvalidTestSelection,

    #[error("Insufficient data: need at least {required} data points, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("Unsupported sample size: {size} (critical values are tabulated up to {max})")]
    UnsupportedSampleSize { size: usize, max: usize },

    #[error("Mixed record shapes: expected {expected}, found {found}")]
    MixedRecordShapes {
        expected: RecordShape,
        found: RecordShape,
    },

    #[error("Unknown record shape with keys {keys:?}")]
    UnknownRecordShape { keys: Vec<String> },

    #[error("Unknown element column: {0}")]
    UnknownColumn(String),

    #[error("Dataset is missing required column: {0}")]
    MissingColumn(String),

    #[error("Malformed row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for outlier operations
pub type Result<T> = std::result::Result<T, OutlierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_confidence_level_display() {
        let error = OutlierError::InvalidConfidenceLevel(80);
        assert_eq!(
            error.to_string(),
            "Invalid confidence level: 80 (critical values are tabulated for 90, 95 and 99)"
        );
    }

    #[test]
    fn test_insufficient_data_display() {
        let error = OutlierError::InsufficientData {
            required: 3,
            got: 2,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient data: need at least 3 data points, got 2"
        );
    }

    #[test]
    fn test_mixed_record_shapes_display() {
        let error = OutlierError::MixedRecordShapes {
            expected: RecordShape::Sample,
            found: RecordShape::SampleSessionElement,
        };
        assert_eq!(
            error.to_string(),
            "Mixed record shapes: expected sample, found sample_session_element"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: OutlierError = io.into();
        assert!(matches!(error, OutlierError::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OutlierError>();
    }
}
