//! Outlier records: which sample, session or single reading to exclude
//!
//! Records are persisted as flat JSON objects keyed by `"Sample ID"`,
//! `"Session"` and `"Element"`. The set of keys present decides the shape:
//!
//! | Keys                               | Shape                    |
//! |------------------------------------|--------------------------|
//! | `Sample ID`                        | `sample`                 |
//! | `Sample ID`, `Session`             | `sample_session`         |
//! | `Sample ID`, `Session`, `Element`  | `sample_session_element` |

use crate::error::{OutlierError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const SAMPLE_ID_KEY: &str = "Sample ID";
const SESSION_KEY: &str = "Session";
const ELEMENT_KEY: &str = "Element";

/// Opaque sample identifier, integer or text as found in the source data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleId {
    Integer(i64),
    Text(String),
}

impl SampleId {
    /// Parse a raw cell; integers are kept as integers only when they
    /// print back to the same text (so `"007"` stays text)
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => SampleId::Integer(n),
            _ => SampleId::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleId::Integer(n) => write!(f, "{}", n),
            SampleId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SampleId {
    fn from(n: i64) -> Self {
        SampleId::Integer(n)
    }
}

impl From<i32> for SampleId {
    fn from(n: i32) -> Self {
        SampleId::Integer(i64::from(n))
    }
}

impl From<&str> for SampleId {
    fn from(s: &str) -> Self {
        SampleId::Text(s.to_string())
    }
}

impl From<String> for SampleId {
    fn from(s: String) -> Self {
        SampleId::Text(s)
    }
}

/// The three record shapes, named after their outlier store lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordShape {
    Sample,
    SampleSession,
    SampleSessionElement,
}

impl RecordShape {
    /// All shapes in store order
    pub const ALL: [RecordShape; 3] = [
        RecordShape::Sample,
        RecordShape::SampleSession,
        RecordShape::SampleSessionElement,
    ];

    /// Name of the store list holding this shape
    pub fn key(self) -> &'static str {
        match self {
            RecordShape::Sample => "sample",
            RecordShape::SampleSession => "sample_session",
            RecordShape::SampleSessionElement => "sample_session_element",
        }
    }
}

impl fmt::Display for RecordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single outlier record
///
/// Equality is structural, so two records with the same fields are the same
/// record regardless of the key order they were read with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub enum OutlierRecord {
    /// Every reading of the sample
    Sample { sample_id: SampleId },
    /// Every reading of the sample in one session
    SampleSession { sample_id: SampleId, session: String },
    /// One element reading of the sample in one session
    SampleSessionElement {
        sample_id: SampleId,
        session: String,
        element: String,
    },
}

impl OutlierRecord {
    pub fn sample(sample_id: impl Into<SampleId>) -> Self {
        OutlierRecord::Sample {
            sample_id: sample_id.into(),
        }
    }

    pub fn sample_session(sample_id: impl Into<SampleId>, session: impl Into<String>) -> Self {
        OutlierRecord::SampleSession {
            sample_id: sample_id.into(),
            session: session.into(),
        }
    }

    pub fn sample_session_element(
        sample_id: impl Into<SampleId>,
        session: impl Into<String>,
        element: impl Into<String>,
    ) -> Self {
        OutlierRecord::SampleSessionElement {
            sample_id: sample_id.into(),
            session: session.into(),
            element: element.into(),
        }
    }

    pub fn shape(&self) -> RecordShape {
        match self {
            OutlierRecord::Sample { .. } => RecordShape::Sample,
            OutlierRecord::SampleSession { .. } => RecordShape::SampleSession,
            OutlierRecord::SampleSessionElement { .. } => RecordShape::SampleSessionElement,
        }
    }

    pub fn sample_id(&self) -> &SampleId {
        match self {
            OutlierRecord::Sample { sample_id }
            | OutlierRecord::SampleSession { sample_id, .. }
            | OutlierRecord::SampleSessionElement { sample_id, .. } => sample_id,
        }
    }

    pub fn session(&self) -> Option<&str> {
        match self {
            OutlierRecord::Sample { .. } => None,
            OutlierRecord::SampleSession { session, .. }
            | OutlierRecord::SampleSessionElement { session, .. } => Some(session),
        }
    }

    pub fn element(&self) -> Option<&str> {
        match self {
            OutlierRecord::SampleSessionElement { element, .. } => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for OutlierRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sample {}", self.sample_id())?;
        if let Some(session) = self.session() {
            write!(f, ", session {}", session)?;
        }
        if let Some(element) = self.element() {
            write!(f, ", element {}", element)?;
        }
        Ok(())
    }
}

/// Flat key/value form of a record as stored in JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Sample ID", default, skip_serializing_if = "Option::is_none")]
    pub sample_id: Option<SampleId>,
    #[serde(rename = "Session", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(rename = "Element", default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawRecord {
    fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if self.sample_id.is_some() {
            keys.push(SAMPLE_ID_KEY.to_string());
        }
        if self.session.is_some() {
            keys.push(SESSION_KEY.to_string());
        }
        if self.element.is_some() {
            keys.push(ELEMENT_KEY.to_string());
        }
        keys.extend(self.extra.keys().cloned());
        keys
    }
}

impl TryFrom<RawRecord> for OutlierRecord {
    type Error = OutlierError;

    fn try_from(raw: RawRecord) -> Result<Self> {
        if !raw.extra.is_empty() {
            return Err(OutlierError::UnknownRecordShape { keys: raw.keys() });
        }
        match raw {
            RawRecord {
                sample_id: Some(sample_id),
                session: None,
                element: None,
                ..
            } => Ok(OutlierRecord::Sample { sample_id }),
            RawRecord {
                sample_id: Some(sample_id),
                session: Some(session),
                element: None,
                ..
            } => Ok(OutlierRecord::SampleSession { sample_id, session }),
            RawRecord {
                sample_id: Some(sample_id),
                session: Some(session),
                element: Some(element),
                ..
            } => Ok(OutlierRecord::SampleSessionElement {
                sample_id,
                session,
                element,
            }),
            other => Err(OutlierError::UnknownRecordShape { keys: other.keys() }),
        }
    }
}

impl From<OutlierRecord> for RawRecord {
    fn from(record: OutlierRecord) -> Self {
        match record {
            OutlierRecord::Sample { sample_id } => RawRecord {
                sample_id: Some(sample_id),
                ..Default::default()
            },
            OutlierRecord::SampleSession { sample_id, session } => RawRecord {
                sample_id: Some(sample_id),
                session: Some(session),
                ..Default::default()
            },
            OutlierRecord::SampleSessionElement {
                sample_id,
                session,
                element,
            } => RawRecord {
                sample_id: Some(sample_id),
                session: Some(session),
                element: Some(element),
                extra: BTreeMap::new(),
            },
        }
    }
}
