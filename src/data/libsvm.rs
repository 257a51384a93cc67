//! LibSVM format dataset loading
//!
//! Supports loading datasets in the libsvm format:
//! label index:value index:value ...
//!
//! Example:
//! 1 1:0.5 3:1.2 7:0.8
//! 3 2:0.3 5:2.1
//!
//! Indices are 1-based and absent features are zero. Labels are kept as
//! written; any number of classes is allowed.

use crate::core::{Problem, Result, SVMError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Largest accepted feature index; rows are densified to the largest index seen
pub const MAX_FEATURE_INDEX: usize = 1 << 24;

/// Sparse rows as read from a LibSVM file
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    rows: Vec<Vec<(usize, f64)>>,
    labels: Vec<f64>,
    dimensions: usize,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Load a dataset from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let mut dimensions = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(SVMError::IoError)?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (label, row) = Self::parse_line(line).map_err(|e| {
                SVMError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            if let Some(max_index) = row.iter().map(|&(index, _)| index).max() {
                dimensions = dimensions.max(max_index + 1);
            }
            labels.push(label);
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(LibSVMDataset {
            rows,
            labels,
            dimensions,
        })
    }

    /// Parse a single line into its label and 0-based `(index, value)` pairs
    fn parse_line(line: &str) -> Result<(f64, Vec<(usize, f64)>)> {
        let mut parts = line.split_whitespace();

        let label_str = parts
            .next()
            .ok_or_else(|| SVMError::ParseError("Empty line".to_string()))?;
        let label = label_str
            .parse::<f64>()
            .map_err(|_| SVMError::ParseError(format!("Invalid label: {label_str}")))?;

        let mut row = Vec::new();
        for feature_str in parts {
            let (index_str, value_str) = feature_str.split_once(':').ok_or_else(|| {
                SVMError::ParseError(format!("Invalid feature format: {feature_str}"))
            })?;

            let index = index_str.parse::<usize>().map_err(|_| {
                SVMError::ParseError(format!("Invalid feature index: {index_str}"))
            })?;
            let value = value_str.parse::<f64>().map_err(|_| {
                SVMError::ParseError(format!("Invalid feature value: {value_str}"))
            })?;

            if index == 0 {
                return Err(SVMError::ParseError(
                    "Feature index must be positive: 0".to_string(),
                ));
            }
            if index > MAX_FEATURE_INDEX {
                return Err(SVMError::ParseError(format!(
                    "Feature index {index} exceeds the limit of {MAX_FEATURE_INDEX}"
                )));
            }
            row.push((index - 1, value));
        }

        Ok((label, row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of features (largest index seen, or as widened by [`Self::with_dim`])
    pub fn dim(&self) -> usize {
        self.dimensions
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Widen the feature space to at least `dim`, so that a test file can be
    /// densified to the width of the training data
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dimensions = self.dimensions.max(dim);
        self
    }

    /// Dense feature vectors, each of length [`Self::dim`]
    pub fn dense_features(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                let mut dense = vec![0.0; self.dimensions];
                for &(index, value) in row {
                    dense[index] = value;
                }
                dense
            })
            .collect()
    }

    /// Convert into a dense training [`Problem`]
    pub fn into_problem(self) -> Result<Problem> {
        let features = self.dense_features();
        Problem::new(features, self.labels)
    }
}
