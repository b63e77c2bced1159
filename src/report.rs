//! Detection report, rendered as text for terminals or as JSON

use crate::config::{DetectionConfig, DetectionMode};
use crate::error::Result;
use crate::records::OutlierRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Outcome of one detection run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    /// Confidence level in percent
    pub confidence_level: u32,
    /// Sliding window size, when streaming detection was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
    /// Element columns screened, in screening order
    pub elements: Vec<String>,
    /// Rows in the screened dataset
    pub total_rows: usize,
    /// Flagged readings, element by element then row order
    pub outliers: Vec<OutlierRecord>,
    /// Flagged readings per element (zero entries included)
    pub per_element: BTreeMap<String, usize>,
}

impl DetectionReport {
    pub fn new(
        config: &DetectionConfig,
        elements: &[String],
        total_rows: usize,
        outliers: Vec<OutlierRecord>,
    ) -> Self {
        let mut per_element: BTreeMap<String, usize> =
            elements.iter().map(|e| (e.clone(), 0)).collect();
        for element in outliers.iter().filter_map(OutlierRecord::element) {
            *per_element.entry(element.to_string()).or_insert(0) += 1;
        }

        let window = match config.mode {
            DetectionMode::Batch => None,
            DetectionMode::Windowed { buffer_samples } => Some(buffer_samples),
        };

        Self {
            confidence_level: config.confidence_level,
            window,
            elements: elements.to_vec(),
            total_rows,
            outliers,
            per_element,
        }
    }

    pub fn has_outliers(&self) -> bool {
        !self.outliers.is_empty()
    }

    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable report
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n=== Dixon Q-test Outlier Report ===");
        let _ = write!(
            out,
            "Confidence: {}%  Rows: {}  Elements: {}",
            self.confidence_level,
            self.total_rows,
            self.elements.len()
        );
        if let Some(window) = self.window {
            let _ = write!(out, "  Window: {}", window);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Total outliers detected: {}", self.outliers.len());

        if !self.has_outliers() {
            return out;
        }

        let _ = writeln!(out, "\nPer element:");
        for (element, count) in self.per_element.iter().filter(|(_, count)| **count > 0) {
            let _ = writeln!(out, "  {:<4} {}", element, count);
        }

        let _ = writeln!(out, "\nFlagged readings:");
        for record in &self.outliers {
            let _ = writeln!(out, "  {}", record);
        }
        out
    }

    /// Print the text report to stderr
    pub fn print_summary(&self) {
        eprint!("{}", self.to_text());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> DetectionReport {
        DetectionReport::new(
            &DetectionConfig::default(),
            &["Cu".to_string(), "Fe".to_string()],
            12,
            vec![
                OutlierRecord::sample_session_element(3, "d1", "Fe"),
                OutlierRecord::sample_session_element(7, "d2", "Fe"),
            ],
        )
    }

    #[test]
    fn test_per_element_counts() {
        let report = report();
        assert_eq!(report.per_element["Fe"], 2);
        assert_eq!(report.per_element["Cu"], 0);
        assert!(report.has_outliers());
        assert_eq!(report.window, None);
    }

    #[test]
    fn test_json_report() {
        let json = report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["confidence_level"], 95);
        assert_eq!(value["total_rows"], 12);
        assert_eq!(value["outliers"][0]["Sample ID"], 3);
        assert_eq!(value["outliers"][1]["Session"], "d2");
        assert!(value.get("window").is_none());
    }

    #[test]
    fn test_text_report() {
        let text = report().to_text();
        assert!(text.contains("Confidence: 95%"));
        assert!(text.contains("Total outliers detected: 2"));
        assert!(text.contains("sample 7, session d2, element Fe"));
        assert!(!text.contains("Cu   0"));
    }

    #[test]
    fn test_windowed_report() {
        let config = DetectionConfig::default().windowed(27);
        let report = DetectionReport::new(&config, &["Fe".to_string()], 40, Vec::new());
        assert_eq!(report.window, Some(27));
        assert!(report.to_text().contains("Window: 27"));
        assert!(!report.to_text().contains("Flagged readings"));
    }
}
