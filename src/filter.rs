//! Row filters for `sample_id` / `date` category selection
//!
//! Supports expressions such as:
//! - `sample_id=A12`
//! - `date=2021-03-04`
//! - `sample_id=A12,date=All` (`All` leaves that category unfiltered)
//! - `sample_id=A12;date=2021-03-04` (`;` and `,` both separate criteria)

use crate::dataset::Sample;
use crate::error::{OutlierError, Result};
use crate::records::SampleId;

const ALL: &str = "All";

/// Category filter over dataset rows; unset criteria match every row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    sample_id: Option<SampleId>,
    session: Option<String>,
}

impl RowFilter {
    /// Create a filter that keeps every row
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_sample_id(mut self, sample_id: impl Into<SampleId>) -> Self {
        self.sample_id = Some(sample_id.into());
        self
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Parse a filter expression like "sample_id=A12,date=2021-03-04"
    pub fn from_expr(expr: &str) -> Result<Self> {
        let mut filter = Self::all();

        for part in expr.split([',', ';']) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let Some((key, value)) = part.split_once('=') else {
                return Err(OutlierError::InvalidFilter(format!(
                    "{}. Expected KEY=VALUE",
                    part
                )));
            };
            let value = value.trim();
            if value.is_empty() {
                return Err(OutlierError::InvalidFilter(format!(
                    "{}. Missing value",
                    part
                )));
            }

            match key.trim() {
                "sample_id" | "sample" => {
                    filter.sample_id = (value != ALL).then(|| SampleId::parse(value));
                }
                "date" | "session" => {
                    filter.session = (value != ALL).then(|| value.to_string());
                }
                other => {
                    return Err(OutlierError::InvalidFilter(format!(
                        "unknown category '{}'. Expected sample_id or date",
                        other
                    )));
                }
            }
        }

        Ok(filter)
    }

    /// Check whether a row passes every criterion
    pub fn matches(&self, sample: &Sample) -> bool {
        self.sample_id
            .as_ref()
            .map_or(true, |id| *id == sample.sample_id)
            && self
                .session
                .as_ref()
                .map_or(true, |session| *session == sample.date)
    }

    /// Whether this filter keeps every row
    pub fn is_all(&self) -> bool {
        self.sample_id.is_none() && self.session.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: impl Into<SampleId>, date: &str) -> Sample {
        Sample {
            sample_id: id.into(),
            date: date.to_string(),
            values: vec![1.0],
            extra: Vec::new(),
        }
    }

    #[test]
    fn test_filter_all_matches_everything() {
        let filter = RowFilter::all();
        assert!(filter.is_all());
        assert!(filter.matches(&sample(1, "d1")));
        assert!(filter.matches(&sample("x", "d2")));
    }

    #[test]
    fn test_filter_sample_id() {
        let filter = RowFilter::from_expr("sample_id=12").unwrap();
        assert!(filter.matches(&sample(12, "d1")));
        assert!(!filter.matches(&sample(13, "d1")));
        assert!(!filter.matches(&sample("012", "d1")));
    }

    #[test]
    fn test_filter_both_categories() {
        let filter = RowFilter::from_expr("sample_id=A1, date=2021-03-04").unwrap();
        assert!(filter.matches(&sample("A1", "2021-03-04")));
        assert!(!filter.matches(&sample("A1", "2021-03-05")));
        assert!(!filter.matches(&sample("A2", "2021-03-04")));
    }

    #[test]
    fn test_filter_all_keyword() {
        let filter = RowFilter::from_expr("sample_id=All,date=d1").unwrap();
        assert!(filter.matches(&sample("anything", "d1")));
        assert!(!filter.matches(&sample("anything", "d2")));
        assert_eq!(RowFilter::from_expr("date=All").unwrap(), RowFilter::all());
    }

    #[test]
    fn test_filter_aliases() {
        let filter = RowFilter::from_expr("sample=5,session=d3").unwrap();
        assert_eq!(filter, RowFilter::all().with_sample_id(5).with_session("d3"));
    }

    #[test]
    fn test_semicolon_separator() {
        let filter = RowFilter::from_expr("sample_id=A1;date=2021-03-04").unwrap();
        assert_eq!(
            filter,
            RowFilter::all().with_sample_id("A1").with_session("2021-03-04")
        );
    }

    #[test]
    fn test_empty_expression_is_all() {
        assert!(RowFilter::from_expr("").unwrap().is_all());
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(RowFilter::from_expr("sample_id").is_err());
        assert!(RowFilter::from_expr("sample_id=").is_err());
        assert!(RowFilter::from_expr("element=Fe").is_err());
    }
}
