// Shared helpers for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const EMPTY_STORE: &str =
    r#"{"sample": [], "sample_session": [], "sample_session_element": []}"#;

/// Path of the bundled assay fixture (10 rows, Fe/Cu/Zn plus a notes column)
pub fn assays_csv() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("assays.csv")
}

/// Temporary directory holding an empty outlier store named `outliers.json`
pub fn temp_store() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("outliers.json");
    fs::write(&path, EMPTY_STORE).unwrap();
    (dir, path)
}
