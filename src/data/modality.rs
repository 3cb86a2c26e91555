use crate::data::loader::{read_drug_names, read_gene_symbols, read_matrix};
use crate::data::ModalityTable;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Namespace prefix for mutation features, so mutation names cannot collide
/// with gene symbols when modalities are merged downstream
pub const MUTATION_PREFIX: &str = "m_";

/// Load the mRNA expression modality
///
/// Transposes the raw gene-by-sample table, then replaces each raw gene ID
/// with its symbol. Every gene ID must resolve; an unmapped ID aborts the
/// load.
pub fn load_mrna<P: AsRef<Path>, Q: AsRef<Path>>(
    matrix_path: P,
    lookup_path: Q,
) -> Result<ModalityTable> {
    info!("Loading mRNA expression from {:?}", matrix_path.as_ref());

    let mut table = read_matrix(matrix_path)?;
    let symbols = read_gene_symbols(lookup_path)?;
    apply_gene_symbols(&mut table, &symbols).context("Failed to rename mRNA features")?;

    Ok(table)
}

/// Load the mutation-call modality, prefixing every feature with `m_`
pub fn load_mutations<P: AsRef<Path>>(matrix_path: P) -> Result<ModalityTable> {
    info!("Loading mutation calls from {:?}", matrix_path.as_ref());

    let mut table = read_matrix(matrix_path)?;
    apply_mutation_prefix(&mut table)?;

    Ok(table)
}

/// Load the methylation modality; probe names are kept verbatim
pub fn load_methylation<P: AsRef<Path>>(matrix_path: P) -> Result<ModalityTable> {
    info!("Loading methylation from {:?}", matrix_path.as_ref());
    read_matrix(matrix_path)
}

/// Load the drug-response modality
///
/// Feature names are rewritten by substring match against the drug-name
/// lookup, first match wins. Unmatched names are preserved, so the feature
/// set never shrinks behind the data's back.
pub fn load_drugs<P: AsRef<Path>, Q: AsRef<Path>>(
    matrix_path: P,
    lookup_path: Q,
) -> Result<ModalityTable> {
    info!("Loading drug response from {:?}", matrix_path.as_ref());

    let mut table = read_matrix(matrix_path)?;
    let names = read_drug_names(lookup_path)?;
    apply_drug_names(&mut table, &names)?;

    Ok(table)
}

/// Replace raw gene IDs with symbols via an exact one-to-one lookup
fn apply_gene_symbols(
    table: &mut ModalityTable,
    symbols: &HashMap<String, String>,
) -> Result<()> {
    let renamed = table
        .features()
        .iter()
        .map(|gene_id| {
            symbols.get(gene_id).cloned().ok_or_else(|| {
                anyhow::anyhow!("No symbol entry for gene ID '{}'", gene_id)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    table.replace_features(renamed)
}

/// Prefix every feature name with the mutation namespace
fn apply_mutation_prefix(table: &mut ModalityTable) -> Result<()> {
    let renamed = table
        .features()
        .iter()
        .map(|name| format!("{}{}", MUTATION_PREFIX, name))
        .collect();
    table.replace_features(renamed)
}

/// Rewrite drug identifiers by first-match-wins substring replacement
///
/// Scans the lookup pairs in file order; on the first substring hit, every
/// occurrence of the substring in the identifier is replaced with the
/// display name and scanning stops. Identifiers with no hit keep their
/// original name.
fn apply_drug_names(table: &mut ModalityTable, names: &[(String, String)]) -> Result<()> {
    let mut renamed = Vec::with_capacity(table.n_features());

    for feature in table.features() {
        let mut replacement = None;
        for (substring, display) in names {
            if substring.is_empty() {
                continue;
            }
            if feature.contains(substring.as_str()) {
                replacement = Some(feature.replace(substring.as_str(), display));
                break;
            }
        }

        match replacement {
            Some(name) => renamed.push(name),
            None => {
                warn!(
                    "No drug name mapping matches '{}', keeping original name",
                    feature
                );
                renamed.push(feature.clone());
            }
        }
    }

    table.replace_features(renamed)
}
