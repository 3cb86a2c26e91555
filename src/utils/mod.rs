use anyhow::{Context, Result};
use std::path::Path;

/// Ensure directory exists
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))?;
    }
    Ok(())
}

/// Validation utilities
pub mod validation {
    use anyhow::{bail, Result};

    /// Find a required column, failing with the table's role in the message
    pub fn require_column(columns: &[String], name: &str, role: &str) -> Result<usize> {
        match columns.iter().position(|c| c == name) {
            Some(pos) => Ok(pos),
            None => bail!(
                "Required column '{}' is missing from the {} table (found: {:?})",
                name,
                role,
                columns
            ),
        }
    }
}
