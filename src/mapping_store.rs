//! Series mapping store module
//!
//! This module provides access to the local association between courses and
//! the remote series they reference.

use crate::config::InstanceId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading series mappings
#[derive(Debug, Error)]
pub enum MappingStoreError {
    /// Failed to read the mapping file
    #[error("Failed to read mapping file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the mapping file
    #[error("Failed to parse mapping file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Association of a course with one series on one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMapping {
    /// Course the series is attached to
    #[serde(rename = "courseid")]
    pub course_id: u64,
    /// Instance hosting the series
    #[serde(rename = "ocinstanceid")]
    pub instance_id: InstanceId,
    /// Series identifier on that instance
    pub series: String,
}

/// Source of series mappings
pub trait SeriesMappingStore {
    /// Returns the mappings of a course in storage order
    fn mappings_for_course(&self, course_id: u64) -> Result<Vec<SeriesMapping>, MappingStoreError>;
}

impl SeriesMappingStore for [SeriesMapping] {
    fn mappings_for_course(&self, course_id: u64) -> Result<Vec<SeriesMapping>, MappingStoreError> {
        Ok(self
            .iter()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect())
    }
}

/// Mapping store backed by a JSON file
///
/// The file holds an array of `{"courseid", "ocinstanceid", "series"}`
/// records. File order is storage order.
#[derive(Debug)]
pub struct JsonMappingStore {
    mappings: Vec<SeriesMapping>,
}

impl JsonMappingStore {
    /// Reads all mappings from `path`
    pub fn open(path: &Path) -> Result<Self, MappingStoreError> {
        let content = fs::read_to_string(path).map_err(|e| MappingStoreError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mappings =
            serde_json::from_str(&content).map_err(|e| MappingStoreError::ParseFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(Self { mappings })
    }
}

impl SeriesMappingStore for JsonMappingStore {
    fn mappings_for_course(&self, course_id: u64) -> Result<Vec<SeriesMapping>, MappingStoreError> {
        self.mappings.as_slice().mappings_for_course(course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_store_filters_by_course_in_file_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"courseid": 2, "ocinstanceid": 1, "series": "b"}},
                {{"courseid": 3, "ocinstanceid": 1, "series": "x"}},
                {{"courseid": 2, "ocinstanceid": 2, "series": "a"}}
            ]"#
        )
        .unwrap();

        let store = JsonMappingStore::open(file.path()).unwrap();
        let mappings = store.mappings_for_course(2).unwrap();

        let series: Vec<_> = mappings.iter().map(|m| m.series.as_str()).collect();
        assert_eq!(series, ["b", "a"]);
        assert_eq!(mappings[1].instance_id, InstanceId(2));
    }

    #[test]
    fn test_unknown_course_is_empty() {
        let mappings: Vec<SeriesMapping> = Vec::new();
        assert!(mappings.as_slice().mappings_for_course(1).unwrap().is_empty());
    }

    #[test]
    fn test_json_store_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = JsonMappingStore::open(file.path());
        assert!(matches!(result, Err(MappingStoreError::ParseFailed { .. })));
    }

    #[test]
    fn test_json_store_missing_file() {
        let result = JsonMappingStore::open(Path::new("/nonexistent/mappings.json"));
        assert!(matches!(result, Err(MappingStoreError::ReadFailed { .. })));
    }
}
