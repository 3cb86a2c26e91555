use crate::assemble::DatasetPaths;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// momics: multi-omics dataset assembly tool
#[derive(Parser, Debug)]
#[command(name = "momics")]
#[command(about = "Multi-omics dataset assembly for CLL factor analysis")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble the multi-modal container from the raw study tables
    Assemble(AssembleArgs),
}

/// Assembly arguments
#[derive(Parser, Debug)]
pub struct AssembleArgs {
    /// Directory holding the raw input tables
    #[arg(short, long, default_value = "data/raw")]
    pub data_dir: PathBuf,

    /// Sample metadata table (overrides the data-dir layout)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Gene-ID-to-symbol lookup table
    #[arg(long)]
    pub gene_ids: Option<PathBuf>,

    /// mRNA expression matrix
    #[arg(long)]
    pub mrna: Option<PathBuf>,

    /// Mutation call matrix
    #[arg(long)]
    pub mutations: Option<PathBuf>,

    /// Methylation matrix
    #[arg(long)]
    pub methylation: Option<PathBuf>,

    /// Drug response matrix
    #[arg(long)]
    pub drugs: Option<PathBuf>,

    /// Drug display-name lookup table
    #[arg(long)]
    pub drug_names: Option<PathBuf>,

    /// Write the assembly summary as JSON to this path
    #[arg(short, long)]
    pub summary: Option<PathBuf>,
}

impl AssembleArgs {
    /// Resolve input paths: data-dir conventions plus per-file overrides
    pub fn dataset_paths(&self) -> DatasetPaths {
        let mut paths = DatasetPaths::from_dir(&self.data_dir);
        if let Some(p) = &self.metadata {
            paths.metadata = p.clone();
        }
        if let Some(p) = &self.gene_ids {
            paths.gene_ids = p.clone();
        }
        if let Some(p) = &self.mrna {
            paths.mrna = p.clone();
        }
        if let Some(p) = &self.mutations {
            paths.mutations = p.clone();
        }
        if let Some(p) = &self.methylation {
            paths.methylation = p.clone();
        }
        if let Some(p) = &self.drugs {
            paths.drugs = p.clone();
        }
        if let Some(p) = &self.drug_names {
            paths.drug_names = p.clone();
        }
        paths
    }
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
pub fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["momics", "assemble"]);

        match cli.command {
            Commands::Assemble(args) => {
                assert_eq!(args.data_dir, PathBuf::from("data/raw"));
                assert!(args.metadata.is_none());
                assert!(args.summary.is_none());
            }
        }
    }

    #[test]
    fn test_dataset_paths_overrides() {
        let cli = Cli::parse_from([
            "momics",
            "assemble",
            "-d",
            "fixtures",
            "--metadata",
            "meta.csv",
            "--drugs",
            "d.tsv",
        ]);

        let Commands::Assemble(args) = cli.command;
        let paths = args.dataset_paths();

        assert_eq!(paths.metadata, PathBuf::from("meta.csv"));
        assert_eq!(paths.drugs, PathBuf::from("d.tsv"));
        assert_eq!(paths.mrna, PathBuf::from("fixtures/cll_mrna.csv"));
        assert_eq!(paths.drug_names, PathBuf::from("fixtures/drug_names.csv"));
    }
}
