use crate::data::metadata::load_metadata;
use crate::data::modality::{load_drugs, load_methylation, load_mrna, load_mutations};
use crate::data::{MetadataTable, ModalityTable, MODALITY_NAMES};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Input file locations for one assembly run
///
/// `Default` gives the conventional `data/raw/` layout; every path can be
/// overridden individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPaths {
    /// Sample metadata table
    pub metadata: PathBuf,
    /// Gene-ID-to-symbol lookup table
    pub gene_ids: PathBuf,
    /// mRNA expression matrix (genes x samples)
    pub mrna: PathBuf,
    /// Mutation call matrix (mutations x samples)
    pub mutations: PathBuf,
    /// Methylation matrix (probes x samples)
    pub methylation: PathBuf,
    /// Drug response matrix (drug/concentration x samples)
    pub drugs: PathBuf,
    /// Drug display-name lookup table
    pub drug_names: PathBuf,
}

impl DatasetPaths {
    /// Conventional file layout under a data directory
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            metadata: dir.join("cll_metadata.csv"),
            gene_ids: dir.join("cll_geneids.csv"),
            mrna: dir.join("cll_mrna.csv"),
            mutations: dir.join("cll_mutations.csv"),
            methylation: dir.join("cll_methylation.csv"),
            drugs: dir.join("cll_drugs.csv"),
            drug_names: dir.join("drug_names.csv"),
        }
    }
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self::from_dir("data/raw")
    }
}

/// The assembled multi-modal container
///
/// Holds one sample-by-feature table per modality plus the per-sample
/// annotation aligned to the combined sample index.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiOmics {
    modalities: Vec<(String, ModalityTable)>,
    obs: MetadataTable,
}

impl MultiOmics {
    /// Build a container from named modality tables and the loaded metadata
    ///
    /// The combined sample index is the union of all modality sample keys
    /// in first-appearance order. Every combined key must resolve in the
    /// metadata; a missing key fails the whole assembly.
    pub fn new(
        modalities: Vec<(String, ModalityTable)>,
        metadata: &MetadataTable,
    ) -> Result<Self> {
        let mut names = HashSet::new();
        for (name, _) in &modalities {
            if !names.insert(name.as_str()) {
                bail!("Duplicate modality name '{}'", name);
            }
        }

        let mut seen = HashSet::new();
        let mut combined = Vec::new();
        for (_, table) in &modalities {
            for sample in table.samples() {
                if seen.insert(sample.clone()) {
                    combined.push(sample.clone());
                }
            }
        }

        let obs = metadata
            .select_rows(&combined)
            .context("Failed to attach sample annotation")?;

        Ok(Self { modalities, obs })
    }

    /// Look up a modality table by name
    pub fn modality(&self, name: &str) -> Option<&ModalityTable> {
        self.modalities
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, table)| table)
    }

    /// Modalities in insertion order
    pub fn modalities(&self) -> impl Iterator<Item = (&str, &ModalityTable)> {
        self.modalities
            .iter()
            .map(|(name, table)| (name.as_str(), table))
    }

    /// Per-sample annotation aligned to the combined sample index
    pub fn obs(&self) -> &MetadataTable {
        &self.obs
    }

    /// Combined sample index
    pub fn sample_ids(&self) -> &[String] {
        self.obs.samples()
    }

    /// Number of samples in the combined index
    pub fn n_samples(&self) -> usize {
        self.obs.len()
    }

    /// Build a summary report of the assembled container
    pub fn summary(&self) -> AssemblySummary {
        AssemblySummary {
            n_samples: self.n_samples(),
            modalities: self
                .modalities
                .iter()
                .map(|(name, table)| ModalitySummary {
                    name: name.clone(),
                    n_samples: table.n_samples(),
                    n_features: table.n_features(),
                })
                .collect(),
            annotation_columns: self.obs.columns().to_vec(),
        }
    }
}

/// Shape report for one modality
#[derive(Debug, Clone, Serialize)]
pub struct ModalitySummary {
    pub name: String,
    pub n_samples: usize,
    pub n_features: usize,
}

/// Shape report for the assembled container
#[derive(Debug, Clone, Serialize)]
pub struct AssemblySummary {
    pub n_samples: usize,
    pub modalities: Vec<ModalitySummary>,
    pub annotation_columns: Vec<String>,
}

impl AssemblySummary {
    /// Log the summary at info level
    pub fn log(&self) {
        info!("Assembled container: {} samples", self.n_samples);
        for modality in &self.modalities {
            info!(
                "  {}: {} samples x {} features",
                modality.name, modality.n_samples, modality.n_features
            );
        }
        info!("  annotation: {} columns", self.annotation_columns.len());
    }
}

/// Load every input table and assemble the multi-modal container
///
/// Fail-fast: any read, rename, or alignment error aborts the whole run
/// with no partial result.
pub fn assemble(paths: &DatasetPaths) -> Result<MultiOmics> {
    info!("Assembling multi-omics dataset");

    let metadata = load_metadata(&paths.metadata)?;

    let tables = vec![
        load_mrna(&paths.mrna, &paths.gene_ids)?,
        load_mutations(&paths.mutations)?,
        load_methylation(&paths.methylation)?,
        load_drugs(&paths.drugs, &paths.drug_names)?,
    ];

    let modalities = MODALITY_NAMES
        .iter()
        .map(|name| name.to_string())
        .zip(tables)
        .collect();

    let container = MultiOmics::new(modalities, &metadata)?;
    info!(
        "Assembly complete: {} samples, {} modalities",
        container.n_samples(),
        MODALITY_NAMES.len()
    );

    Ok(container)
}
