//! Tabular chemical-composition dataset
//!
//! A dataset is an ordered list of samples. Each row carries a `sample_id`,
//! the measurement session (`date`), one numeric value per element column
//! (NaN when missing) and any other source columns as text.

use crate::elements::resolve_elements;
use crate::error::{OutlierError, Result};
use crate::filter::RowFilter;
use crate::records::SampleId;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

pub const SAMPLE_ID_COLUMN: &str = "sample_id";
pub const DATE_COLUMN: &str = "date";

/// One measured sample in one session
#[derive(Debug, Clone)]
pub struct Sample {
    pub sample_id: SampleId,
    pub date: String,
    /// Element values, aligned with [`Dataset::elements`]
    pub values: Vec<f64>,
    /// Pass-through column values, aligned with [`Dataset::extra_columns`]
    pub extra: Vec<String>,
}

impl PartialEq for Sample {
    // Missing readings compare equal so datasets can be compared after nulling
    fn eq(&self, other: &Self) -> bool {
        self.sample_id == other.sample_id
            && self.date == other.date
            && self.extra == other.extra
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    SampleId,
    Date,
    Element(usize),
    Extra(usize),
}

/// Ordered collection of samples with a fixed set of element columns
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    header: Vec<String>,
    layout: Vec<Column>,
    elements: Vec<String>,
    extra_columns: Vec<String>,
    rows: Vec<Sample>,
}

impl Dataset {
    /// Create an empty dataset with `sample_id`, `date` and the given element columns
    pub fn new<S: Into<String>>(elements: impl IntoIterator<Item = S>) -> Self {
        let elements: Vec<String> = elements.into_iter().map(Into::into).collect();
        let mut header = vec![SAMPLE_ID_COLUMN.to_string(), DATE_COLUMN.to_string()];
        header.extend(elements.iter().cloned());
        let mut layout = vec![Column::SampleId, Column::Date];
        layout.extend((0..elements.len()).map(Column::Element));

        Self {
            header,
            layout,
            elements,
            extra_columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a row; `values` must hold one entry per element column
    pub fn push(
        &mut self,
        sample_id: impl Into<SampleId>,
        date: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<()> {
        if values.len() != self.elements.len() {
            return Err(OutlierError::MalformedRow {
                row: self.rows.len() + 1,
                message: format!(
                    "expected {} element values, got {}",
                    self.elements.len(),
                    values.len()
                ),
            });
        }
        self.rows.push(Sample {
            sample_id: sample_id.into(),
            date: date.into(),
            values,
            extra: vec![String::new(); self.extra_columns.len()],
        });
        Ok(())
    }

    /// Load a CSV file
    ///
    /// With `elements` unset, element columns are resolved from the header.
    pub fn from_csv_path(path: impl AsRef<Path>, elements: Option<&[String]>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(BufReader::new(file), elements)
    }

    /// Load CSV content from any reader
    pub fn from_csv_reader<R: Read>(reader: R, elements: Option<&[String]>) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        for required in [SAMPLE_ID_COLUMN, DATE_COLUMN] {
            if !header.iter().any(|h| h == required) {
                return Err(OutlierError::MissingColumn(required.to_string()));
            }
        }

        let elements: Vec<String> = match elements {
            Some(requested) => {
                if let Some(reserved) = requested
                    .iter()
                    .find(|e| *e == SAMPLE_ID_COLUMN || *e == DATE_COLUMN)
                {
                    return Err(OutlierError::InvalidConfig(format!(
                        "`{}` is an identifier column, not an element",
                        reserved
                    )));
                }
                if let Some(missing) = requested
                    .iter()
                    .find(|e| !header.iter().any(|h| h == *e))
                {
                    return Err(OutlierError::UnknownColumn(missing.clone()));
                }
                requested.to_vec()
            }
            None => resolve_elements(&header),
        };

        let mut extra_columns = Vec::new();
        let layout: Vec<Column> = header
            .iter()
            .map(|name| {
                if name == SAMPLE_ID_COLUMN {
                    Column::SampleId
                } else if name == DATE_COLUMN {
                    Column::Date
                } else if let Some(i) = elements.iter().position(|e| e == name) {
                    Column::Element(i)
                } else {
                    extra_columns.push(name.clone());
                    Column::Extra(extra_columns.len() - 1)
                }
            })
            .collect();

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result?;
            let mut sample = Sample {
                sample_id: SampleId::Text(String::new()),
                date: String::new(),
                values: vec![f64::NAN; elements.len()],
                extra: vec![String::new(); extra_columns.len()],
            };
            for (column, field) in layout.iter().zip(record.iter()) {
                match *column {
                    Column::SampleId => sample.sample_id = SampleId::parse(field),
                    Column::Date => sample.date = field.to_string(),
                    Column::Element(i) => {
                        sample.values[i] = parse_value(field).ok_or_else(|| {
                            OutlierError::MalformedRow {
                                row: line + 1,
                                message: format!(
                                    "invalid value '{}' for element {}",
                                    field, elements[i]
                                ),
                            }
                        })?;
                    }
                    Column::Extra(i) => sample.extra[i] = field.to_string(),
                }
            }
            rows.push(sample);
        }

        Ok(Self {
            header,
            layout,
            elements,
            extra_columns,
            rows,
        })
    }

    /// Write the dataset as CSV in its original column order; missing values
    /// are written as empty cells
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.header)?;
        for sample in &self.rows {
            let record: Vec<String> = self
                .layout
                .iter()
                .map(|column| match *column {
                    Column::SampleId => sample.sample_id.to_string(),
                    Column::Date => sample.date.clone(),
                    Column::Element(i) => format_value(sample.values[i]),
                    Column::Extra(i) => sample.extra[i].clone(),
                })
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the dataset to a CSV file
    pub fn to_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_csv(file)
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn rows(&self) -> &[Sample] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of an element column
    pub fn element_index(&self, element: &str) -> Result<usize> {
        self.elements
            .iter()
            .position(|e| e == element)
            .ok_or_else(|| OutlierError::UnknownColumn(element.to_string()))
    }

    /// All values of one element column in row order, NaN where missing
    pub fn column(&self, element: &str) -> Result<Vec<f64>> {
        let index = self.element_index(element)?;
        Ok(self.rows.iter().map(|s| s.values[index]).collect())
    }

    /// Finite values of one element column, ready for a histogram or violin trace
    pub fn series(&self, element: &str) -> Result<Vec<f64>> {
        Ok(self
            .column(element)?
            .into_iter()
            .filter(|v| v.is_finite())
            .collect())
    }

    /// Value of `element` in row `row`
    pub fn value(&self, row: usize, element: &str) -> Option<f64> {
        let index = self.element_index(element).ok()?;
        self.rows.get(row).map(|s| s.values[index])
    }

    /// Distinct sample identifiers in first-seen order
    pub fn unique_sample_ids(&self) -> Vec<SampleId> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|s| seen.insert(&s.sample_id))
            .map(|s| s.sample_id.clone())
            .collect()
    }

    /// Distinct sessions in first-seen order
    pub fn unique_sessions(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|s| seen.insert(s.date.as_str()))
            .map(|s| s.date.clone())
            .collect()
    }

    /// Rows matching every criterion of `filter`
    pub fn filter(&self, filter: &RowFilter) -> Dataset {
        Dataset {
            rows: self
                .rows
                .iter()
                .filter(|s| filter.matches(s))
                .cloned()
                .collect(),
            ..self.without_rows()
        }
    }

    fn without_rows(&self) -> Dataset {
        Dataset {
            header: self.header.clone(),
            layout: self.layout.clone(),
            elements: self.elements.clone(),
            extra_columns: self.extra_columns.clone(),
            rows: Vec::new(),
        }
    }

    /// Keep only rows for which `keep` returns true; returns how many were dropped
    pub(crate) fn retain_rows<F: FnMut(&Sample) -> bool>(&mut self, keep: F) -> usize {
        let before = self.rows.len();
        self.rows.retain(keep);
        before - self.rows.len()
    }

    /// Set `element_index` to missing on every row matching `matches`;
    /// returns how many cells were touched
    pub(crate) fn null_where<F: Fn(&Sample) -> bool>(
        &mut self,
        element_index: usize,
        matches: F,
    ) -> usize {
        let mut touched = 0;
        for sample in self.rows.iter_mut().filter(|s| matches(s)) {
            sample.values[element_index] = f64::NAN;
            touched += 1;
        }
        touched
    }
}

fn parse_value(field: &str) -> Option<f64> {
    match field {
        "" | "NaN" | "nan" | "NA" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
