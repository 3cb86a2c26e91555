use crate::data::loader::{read_table, RawTable};
use crate::data::{MetadataTable, Value, MISSING_SENTINEL, SAMPLE_ID_COLUMN};
use crate::utils::validation::require_column;
use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Source column renamed to `Sex` on load
pub const GENDER_COLUMN: &str = "Gender";

/// Output name of the recoded gender column
pub const SEX_COLUMN: &str = "Sex";

/// IGHV mutation status column, recoded when present
pub const IGHV_COLUMN: &str = "IGHV";

/// Prediction target column, dropped on load
pub const OUTCOME_COLUMN: &str = "died";

/// Load the sample metadata table
///
/// Applies, in order: rename `Gender` to `Sex`, recode Sex (m/f to 0/1),
/// recode IGHV (U/M to 0/1), fill missing cells with the -1 sentinel, and
/// drop the `died` outcome column. The `Sample`, `Gender`, and `died`
/// columns are required; their absence is a data-contract violation.
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<MetadataTable> {
    let path = path.as_ref();
    info!("Loading sample metadata from {:?}", path);

    let raw = read_table(path)?;
    metadata_from_table(&raw).with_context(|| format!("Failed to load metadata from {:?}", path))
}

fn metadata_from_table(raw: &RawTable) -> Result<MetadataTable> {
    let sample_col = require_column(&raw.columns, SAMPLE_ID_COLUMN, "metadata")?;
    let gender_col = require_column(&raw.columns, GENDER_COLUMN, "metadata")?;
    let outcome_col = require_column(&raw.columns, OUTCOME_COLUMN, "metadata")?;

    // Kept attribute columns: index and outcome removed, Gender renamed
    let mut kept: Vec<(usize, String)> = Vec::new();
    for (pos, name) in raw.columns.iter().enumerate() {
        if pos == sample_col || pos == outcome_col {
            continue;
        }
        let out_name = if pos == gender_col {
            SEX_COLUMN.to_string()
        } else {
            name.clone()
        };
        kept.push((pos, out_name));
    }

    let mut table = MetadataTable::new(kept.iter().map(|(_, name)| name.clone()).collect());

    for row in &raw.rows {
        let sample = row[sample_col].trim().to_string();
        if sample.is_empty() {
            bail!("Metadata row with empty sample ID");
        }

        let mut cells = Vec::with_capacity(kept.len());
        for (pos, name) in &kept {
            cells.push(load_cell(row[*pos].trim(), name, &sample));
        }
        table.push_row(sample, cells)?;
    }

    info!(
        "Loaded metadata: {} samples x {} attributes",
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

/// Transform one metadata cell
fn load_cell(raw: &str, column: &str, sample: &str) -> Value {
    if matches!(raw, "" | "NA" | "NaN" | "nan") {
        return Value::Number(MISSING_SENTINEL);
    }
    match column {
        SEX_COLUMN => recode(raw, &[("m", 0.0), ("f", 1.0)], column, sample),
        IGHV_COLUMN => recode(raw, &[("U", 0.0), ("M", 1.0)], column, sample),
        _ => infer(raw),
    }
}

/// Map a categorical code to its numeric value, keeping unknown codes as-is
fn recode(raw: &str, map: &[(&str, f64)], column: &str, sample: &str) -> Value {
    for (code, value) in map {
        if raw == *code {
            return Value::Number(*value);
        }
    }
    warn!(
        "Unrecognized {} code '{}' for sample '{}', keeping original value",
        column, raw, sample
    );
    Value::Text(raw.to_string())
}

fn infer(raw: &str) -> Value {
    match raw.parse::<f64>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::Text(raw.to_string()),
    }
}
