//! Assay - Dixon's Q-test outlier detection for chemical-composition datasets
//!
//! This library screens element columns of a sample/session dataset with
//! Dixon's Q-test, keeps flagged readings in a persisted outlier store, and
//! applies that store back onto datasets by deleting rows or nulling cells.
//!
//! ```
//! use assay::dataset::Dataset;
//! use assay::reconcile;
//!
//! let mut data = Dataset::new(["Fe"]);
//! for (id, value) in [(1, 10.0), (2, 10.1), (3, 9.9), (4, 10.0), (5, 55.0)] {
//!     data.push(id, "2021-03-04", vec![value]).unwrap();
//! }
//!
//! let records = reconcile::detect(&["Fe"], &data).unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].to_string(), "sample 5, session 2021-03-04, element Fe");
//! ```

pub mod cli;
pub mod config;
pub mod dataset;
pub mod dixon;
pub mod elements;
pub mod error;
pub mod filter;
pub mod records;
pub mod reconcile;
pub mod report;
pub mod store;
pub mod summary;
pub mod window;

pub use error::{OutlierError, Result};
