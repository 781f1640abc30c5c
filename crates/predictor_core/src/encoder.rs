//! One-hot encoding of categorical match context
//!
//! Each fitted column contributes one indicator per category observed during
//! fit. Vocabularies are kept sorted so the output layout depends only on the
//! set of training values, never on row order. Values unseen at fit time
//! encode as an all-zero block for their column.

use crate::errors::{PredictorError, Result};
use crate::types::CategoricalFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fitted one-hot encoder over an ordered set of categorical columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    vocabularies: Vec<Vec<String>>,
    offsets: Vec<usize>,
    width: usize,
}

impl OneHotEncoder {
    /// Learn per-column vocabularies from a training frame
    pub fn fit(frame: &CategoricalFrame) -> Self {
        let columns = frame.columns().to_vec();
        let mut seen: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); columns.len()];
        for row in frame.rows() {
            for (set, value) in seen.iter_mut().zip(row) {
                set.insert(value.as_str());
            }
        }

        let vocabularies: Vec<Vec<String>> = seen
            .into_iter()
            .map(|set| set.into_iter().map(str::to_string).collect())
            .collect();

        let mut offsets = Vec::with_capacity(vocabularies.len());
        let mut width = 0;
        for vocab in &vocabularies {
            offsets.push(width);
            width += vocab.len();
        }

        Self {
            columns,
            vocabularies,
            offsets,
            width,
        }
    }

    /// Column names in encoding order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Total number of indicator dimensions
    pub fn width(&self) -> usize {
        self.width
    }

    /// Fitted categories for a column, sorted
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(&self.vocabularies[idx])
    }

    /// `column=value` names of every output dimension
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.vocabularies)
            .flat_map(|(col, vocab)| vocab.iter().map(move |v| format!("{}={}", col, v)))
            .collect()
    }

    /// Indices of the active indicators for one row, skipping unseen values
    pub fn active_indices(&self, row: &[String]) -> Result<Vec<usize>> {
        if row.len() != self.columns.len() {
            return Err(PredictorError::DimensionMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }

        Ok(row
            .iter()
            .enumerate()
            .filter_map(|(col, value)| {
                self.vocabularies[col]
                    .binary_search(value)
                    .ok()
                    .map(|pos| self.offsets[col] + pos)
            })
            .collect())
    }

    /// Encode one row as a dense 0/1 vector of the fitted width
    pub fn transform_row(&self, row: &[String]) -> Result<Vec<f64>> {
        let mut encoded = vec![0.0; self.width];
        for idx in self.active_indices(row)? {
            encoded[idx] = 1.0;
        }
        Ok(encoded)
    }

    /// Encode a frame whose columns must match the fitted columns exactly
    pub fn transform(&self, frame: &CategoricalFrame) -> Result<Vec<Vec<f64>>> {
        if frame.columns() != self.columns.as_slice() {
            return Err(PredictorError::SchemaMismatch {
                expected: self.columns.clone(),
                found: frame.columns().to_vec(),
            });
        }
        frame.rows().iter().map(|row| self.transform_row(row)).collect()
    }

    /// Structural consistency check after deserialization
    pub fn validate(&self) -> Result<()> {
        if self.vocabularies.len() != self.columns.len() || self.offsets.len() != self.columns.len()
        {
            return Err(PredictorError::Artifact(
                "encoder column, vocabulary and offset counts differ".into(),
            ));
        }

        let mut expected_offset = 0;
        for (col, (vocab, &offset)) in self.vocabularies.iter().zip(&self.offsets).enumerate() {
            if offset != expected_offset {
                return Err(PredictorError::Artifact(format!(
                    "encoder offset for column {} is {}, expected {}",
                    self.columns[col], offset, expected_offset
                )));
            }
            if vocab.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PredictorError::Artifact(format!(
                    "encoder vocabulary for column {} is not sorted and unique",
                    self.columns[col]
                )));
            }
            expected_offset += vocab.len();
        }

        if expected_offset != self.width {
            return Err(PredictorError::Artifact(format!(
                "encoder width {} does not match vocabulary total {}",
                self.width, expected_offset
            )));
        }
        Ok(())
    }
}
