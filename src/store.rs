//! Persisted outlier store
//!
//! The store is a JSON document with exactly three lists, one per record
//! shape:
//!
//! ```json
//! {
//!     "sample": [{"Sample ID": 12}],
//!     "sample_session": [{"Sample ID": 12, "Session": "2021-03-04"}],
//!     "sample_session_element": []
//! }
//! ```
//!
//! It is read in full and rewritten in full on every save. Access is assumed
//! to be single-writer; callers serialize concurrent merges themselves.

use crate::error::{OutlierError, Result};
use crate::records::{OutlierRecord, RawRecord, RecordShape};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Outlier records grouped by shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStore")]
pub struct OutlierStore {
    pub sample: Vec<OutlierRecord>,
    pub sample_session: Vec<OutlierRecord>,
    pub sample_session_element: Vec<OutlierRecord>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStore {
    sample: Vec<RawRecord>,
    sample_session: Vec<RawRecord>,
    sample_session_element: Vec<RawRecord>,
}

impl TryFrom<RawStore> for OutlierStore {
    type Error = OutlierError;

    fn try_from(raw: RawStore) -> Result<Self> {
        Ok(Self {
            sample: typed_list(raw.sample, RecordShape::Sample)?,
            sample_session: typed_list(raw.sample_session, RecordShape::SampleSession)?,
            sample_session_element: typed_list(
                raw.sample_session_element,
                RecordShape::SampleSessionElement,
            )?,
        })
    }
}

fn typed_list(raw: Vec<RawRecord>, expected: RecordShape) -> Result<Vec<OutlierRecord>> {
    raw.into_iter()
        .map(|r| {
            let record = OutlierRecord::try_from(r)?;
            if record.shape() != expected {
                return Err(OutlierError::MixedRecordShapes {
                    expected,
                    found: record.shape(),
                });
            }
            Ok(record)
        })
        .collect()
}

impl OutlierStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of one shape
    pub fn list(&self, shape: RecordShape) -> &[OutlierRecord] {
        match shape {
            RecordShape::Sample => &self.sample,
            RecordShape::SampleSession => &self.sample_session,
            RecordShape::SampleSessionElement => &self.sample_session_element,
        }
    }

    fn list_mut(&mut self, shape: RecordShape) -> &mut Vec<OutlierRecord> {
        match shape {
            RecordShape::Sample => &mut self.sample,
            RecordShape::SampleSession => &mut self.sample_session,
            RecordShape::SampleSessionElement => &mut self.sample_session_element,
        }
    }

    /// Total number of records across all three lists
    pub fn len(&self) -> usize {
        self.sample.len() + self.sample_session.len() + self.sample_session_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records in store order (sample, sample_session, sample_session_element)
    pub fn records(&self) -> impl Iterator<Item = &OutlierRecord> {
        self.sample
            .iter()
            .chain(self.sample_session.iter())
            .chain(self.sample_session_element.iter())
    }

    /// Merge records of a single shape and deduplicate every list
    ///
    /// The shape is taken from the first record; every other record must
    /// share it. Nothing is modified when the shapes are mixed. Returns the
    /// number of records that were not already present.
    pub fn merge(&mut self, records: Vec<OutlierRecord>) -> Result<usize> {
        let Some(first) = records.first() else {
            return Ok(0);
        };
        let shape = first.shape();
        if let Some(mismatch) = records.iter().find(|r| r.shape() != shape) {
            return Err(OutlierError::MixedRecordShapes {
                expected: shape,
                found: mismatch.shape(),
            });
        }

        let incoming = records.len();
        self.dedup();
        let list = self.list_mut(shape);
        let mut added = 0;
        for record in records {
            if !list.contains(&record) {
                list.push(record);
                added += 1;
            }
        }

        debug!(
            shape = %shape,
            incoming,
            added,
            "merged outlier records"
        );
        Ok(added)
    }

    /// Drop repeated records from each list, keeping first occurrences
    pub fn dedup(&mut self) {
        for shape in RecordShape::ALL {
            let mut seen = HashSet::new();
            self.list_mut(shape).retain(|r| seen.insert(r.clone()));
        }
    }

    /// Parse a store document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawStore = serde_json::from_str(content)?;
        Self::try_from(raw)
    }

    /// Render the document with four-space indentation
    pub fn to_json_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Read a store document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let store = Self::from_json_str(&content)?;
        debug!(
            path = %path.display(),
            records = store.len(),
            "loaded outlier store"
        );
        Ok(store)
    }

    /// Rewrite the whole document on disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut content = self.to_json_string()?;
        content.push('\n');
        fs::write(path, content)?;
        info!(
            path = %path.display(),
            records = self.len(),
            "saved outlier store"
        );
        Ok(())
    }

    /// Create an empty store document, refusing to replace an existing one
    /// unless `force` is set
    pub fn init(path: impl AsRef<Path>, force: bool) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() && !force {
            return Err(OutlierError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("outlier store already exists: {}", path.display()),
            )));
        }
        let store = Self::new();
        store.save(path)?;
        Ok(store)
    }
}
