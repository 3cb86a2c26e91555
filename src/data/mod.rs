pub mod loader;
pub mod metadata;
pub mod modality;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the sample-identifier column in the metadata table
pub const SAMPLE_ID_COLUMN: &str = "Sample";

/// Modality names, in container insertion order
pub const MODALITY_NAMES: &[&str] = &["mrna", "mutations", "methylations", "drugs"];

/// Sentinel written into metadata cells that are missing in the source
pub const MISSING_SENTINEL: f64 = -1.0;

/// A single metadata cell
///
/// Recoding leaves unrecognized Sex/IGHV codes untouched, so a column can
/// hold numeric codes next to original source strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the cell, if it is numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    /// Text view of the cell, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Text(s) => Some(s.as_str()),
        }
    }
}

/// Sample-indexed attribute table
///
/// Row order follows the source file; lookups by sample ID go through an
/// exact-key map, so a key absent from the table is always visible to the
/// caller rather than resolving to a default row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTable {
    samples: Vec<String>,
    columns: Vec<String>,
    cells: Vec<Vec<Value>>,
    index: HashMap<String, usize>,
}

impl MetadataTable {
    /// Create an empty table with the given attribute columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            samples: Vec::new(),
            columns,
            cells: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Append one sample row
    pub fn push_row(&mut self, sample: String, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            bail!(
                "Sample '{}' has {} cells but the table has {} columns",
                sample,
                row.len(),
                self.columns.len()
            );
        }
        if self.index.contains_key(&sample) {
            bail!("Duplicate sample ID in metadata: '{}'", sample);
        }
        self.index.insert(sample.clone(), self.samples.len());
        self.samples.push(sample);
        self.cells.push(row);
        Ok(())
    }

    /// Sample IDs in row order
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Attribute column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of sample rows
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Position of a column by name
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Row cells for a sample ID
    pub fn row(&self, sample: &str) -> Option<&[Value]> {
        self.index.get(sample).map(|&i| self.cells[i].as_slice())
    }

    /// Single cell by sample ID and column name
    pub fn get(&self, sample: &str, column: &str) -> Option<&Value> {
        let col = self.column_position(column)?;
        self.row(sample).map(|r| &r[col])
    }

    /// Build a new table holding the given sample keys, in the given order
    ///
    /// Every key must resolve; a key absent from this table is an error,
    /// not a skipped or null-filled row.
    pub fn select_rows(&self, keys: &[String]) -> Result<MetadataTable> {
        let mut selected = MetadataTable::new(self.columns.clone());
        for key in keys {
            let row = self
                .row(key)
                .ok_or_else(|| anyhow::anyhow!("Sample '{}' is not present in the metadata", key))?;
            selected.push_row(key.clone(), row.to_vec())?;
        }
        Ok(selected)
    }
}

/// Numeric sample-by-feature matrix for one modality
#[derive(Debug, Clone, PartialEq)]
pub struct ModalityTable {
    samples: Vec<String>,
    features: Vec<String>,
    values: Vec<f64>,
}

impl ModalityTable {
    /// Create a table from a row-major value buffer
    pub fn new(samples: Vec<String>, features: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if values.len() != samples.len() * features.len() {
            bail!(
                "Value buffer holds {} cells, expected {} samples x {} features",
                values.len(),
                samples.len(),
                features.len()
            );
        }
        Ok(Self {
            samples,
            features,
            values,
        })
    }

    /// Number of sample rows
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Sample IDs in row order
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Feature names in column order
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// All values for one sample row
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.samples.len() {
            return None;
        }
        let start = index * self.features.len();
        Some(&self.values[start..start + self.features.len()])
    }

    /// Single cell by sample ID and feature name
    pub fn get(&self, sample: &str, feature: &str) -> Option<f64> {
        let row = self.samples.iter().position(|s| s == sample)?;
        let col = self.features.iter().position(|f| f == feature)?;
        Some(self.values[row * self.features.len() + col])
    }

    /// Replace the feature names, keeping the data columns in place
    ///
    /// The replacement must cover every column, so labels and data can
    /// never drift apart.
    pub fn replace_features(&mut self, features: Vec<String>) -> Result<()> {
        if features.len() != self.features.len() {
            bail!(
                "Replacement has {} feature names, table has {} columns",
                features.len(),
                self.features.len()
            );
        }
        self.features = features;
        Ok(())
    }
}
