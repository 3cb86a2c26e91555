use crate::data::ModalityTable;
use crate::utils::validation::require_column;
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Supported table file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    Tsv,
    GzippedCsv,
    GzippedTsv,
}

impl FileFormat {
    /// Detect file format from path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_lowercase())
            .ok_or_else(|| anyhow::anyhow!("Cannot read file name from path {:?}", path))?;

        let (stem, gzipped) = match name.strip_suffix(".gz") {
            Some(stem) => (stem, true),
            None => (name.as_str(), false),
        };

        if stem.ends_with(".csv") {
            Ok(if gzipped {
                FileFormat::GzippedCsv
            } else {
                FileFormat::Csv
            })
        } else if stem.ends_with(".tsv") || stem.ends_with(".txt") {
            Ok(if gzipped {
                FileFormat::GzippedTsv
            } else {
                FileFormat::Tsv
            })
        } else {
            bail!("Unsupported table format: {:?}", path);
        }
    }

    /// Get delimiter character
    pub fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv | FileFormat::GzippedCsv => b',',
            FileFormat::Tsv | FileFormat::GzippedTsv => b'\t',
        }
    }

    /// Check if format is gzipped
    pub fn is_gzipped(&self) -> bool {
        matches!(self, FileFormat::GzippedCsv | FileFormat::GzippedTsv)
    }
}

/// A delimited table read verbatim: header row plus string cells
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Header cells, including the leading index label
    pub columns: Vec<String>,
    /// Data rows, each as long as the header
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of a header cell by name
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Read a delimited table from disk, transparently decompressing gzip
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    debug!("Reading {:?} as {:?}", path, format);

    let file = File::open(path).with_context(|| format!("Failed to open table file {:?}", path))?;

    let table = if format.is_gzipped() {
        parse_table(BufReader::new(GzDecoder::new(file)), format)
    } else {
        parse_table(BufReader::new(file), format)
    };
    table.with_context(|| format!("Failed to read table {:?}", path))
}

/// Parse a delimited table from any reader
fn parse_table<R: Read>(reader: R, format: FileFormat) -> Result<RawTable> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader
        .headers()
        .context("Failed to parse header row")?
        .iter()
        .map(|s| s.to_string())
        .collect();

    if columns.is_empty() {
        bail!("Table has no header row");
    }

    let mut rows = Vec::new();
    for (line, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse row {}", line + 2))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    debug!("Parsed {} columns x {} rows", columns.len(), rows.len());
    Ok(RawTable { columns, rows })
}

/// Read a feature-by-sample matrix file and transpose it to sample-by-feature
///
/// The source layout has features as rows and samples as columns, with the
/// first column holding feature labels and the header row holding sample IDs.
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<ModalityTable> {
    let path = path.as_ref();
    let table = read_table(path)?;
    transpose(&table).with_context(|| format!("Failed to build matrix from {:?}", path))
}

/// Transpose a raw feature-by-sample table into a numeric modality table
fn transpose(table: &RawTable) -> Result<ModalityTable> {
    if table.columns.len() < 2 {
        bail!("Matrix table has no sample columns");
    }

    let samples: Vec<String> = table.columns[1..].to_vec();
    let n_samples = samples.len();
    let n_features = table.rows.len();

    let mut features = Vec::with_capacity(n_features);
    let mut values = vec![0.0f64; n_samples * n_features];

    for (fi, row) in table.rows.iter().enumerate() {
        let label = row[0].trim().to_string();
        for si in 0..n_samples {
            values[si * n_features + fi] = parse_cell(&row[si + 1]).with_context(|| {
                format!("Bad value for feature '{}', sample '{}'", label, samples[si])
            })?;
        }
        features.push(label);
    }

    info!(
        "Loaded matrix: {} samples x {} features",
        n_samples, n_features
    );
    ModalityTable::new(samples, features, values)
}

/// Parse one matrix cell; empty and NA markers become NaN
fn parse_cell(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    match trimmed {
        "" | "NA" | "NaN" | "nan" => Ok(f64::NAN),
        _ => trimmed
            .parse::<f64>()
            .with_context(|| format!("Not a number: '{}'", trimmed)),
    }
}

/// Load the gene-ID-to-symbol lookup table
///
/// Requires GENEID and SYMBOL columns. Each gene ID must map to exactly one
/// symbol; conflicting duplicate entries are a data error.
pub fn read_gene_symbols<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    let table = read_table(path)?;

    let id_col = require_column(&table.columns, "GENEID", "gene symbol lookup")?;
    let symbol_col = require_column(&table.columns, "SYMBOL", "gene symbol lookup")?;

    let mut symbols = HashMap::new();
    for row in &table.rows {
        let gene_id = row[id_col].trim().to_string();
        let symbol = row[symbol_col].trim().to_string();
        if let Some(previous) = symbols.insert(gene_id.clone(), symbol.clone()) {
            if previous != symbol {
                bail!(
                    "Ambiguous symbol mapping for gene '{}' in {:?}: '{}' vs '{}'",
                    gene_id,
                    path,
                    previous,
                    symbol
                );
            }
        }
    }

    info!("Loaded {} gene symbol mappings", symbols.len());
    Ok(symbols)
}

/// Load the drug-name lookup table as ordered (substring, display name) pairs
///
/// The first column holds the substring to search for; the display name
/// comes from the `name` column. File row order is the scan order used by
/// the first-match-wins rename policy.
pub fn read_drug_names<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let table = read_table(path)?;

    let name_col = require_column(&table.columns, "name", "drug name lookup")?;

    let mut pairs = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        pairs.push((row[0].trim().to_string(), row[name_col].trim().to_string()));
    }

    info!("Loaded {} drug name mappings", pairs.len());
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_file_format_detection() {
        assert_eq!(FileFormat::from_path("data.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path("data.tsv").unwrap(), FileFormat::Tsv);
        assert_eq!(FileFormat::from_path("names.txt").unwrap(), FileFormat::Tsv);
        assert_eq!(
            FileFormat::from_path("data.csv.gz").unwrap(),
            FileFormat::GzippedCsv
        );
        assert_eq!(
            FileFormat::from_path("data.tsv.gz").unwrap(),
            FileFormat::GzippedTsv
        );
        assert!(FileFormat::from_path("data.parquet").is_err());
    }

    #[test]
    fn test_parse_table() {
        let data = "Gene,S1,S2\ng1,1.0,2.0\ng2,3.0,4.0";
        let table = parse_table(Cursor::new(data), FileFormat::Csv).unwrap();

        assert_eq!(table.columns, vec!["Gene", "S1", "S2"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["g1", "1.0", "2.0"]);
        assert_eq!(table.column_position("S2"), Some(2));
    }

    #[test]
    fn test_transpose_swaps_axes() {
        let data = "Gene,S1,S2\ng1,1.0,2.0\ng2,3.0,4.0\ng3,5.0,6.0";
        let table = parse_table(Cursor::new(data), FileFormat::Csv).unwrap();
        let matrix = transpose(&table).unwrap();

        // Output rows = input columns, output columns = input rows
        assert_eq!(matrix.n_samples(), 2);
        assert_eq!(matrix.n_features(), 3);
        assert_eq!(matrix.samples(), &["S1".to_string(), "S2".to_string()]);
        assert_eq!(
            matrix.features(),
            &["g1".to_string(), "g2".to_string(), "g3".to_string()]
        );
        assert_eq!(matrix.get("S1", "g2"), Some(3.0));
        assert_eq!(matrix.get("S2", "g3"), Some(6.0));
    }

    #[test]
    fn test_transpose_parses_missing_as_nan() {
        let data = "Probe,S1\np1,NA\np2,";
        let table = parse_table(Cursor::new(data), FileFormat::Csv).unwrap();
        let matrix = transpose(&table).unwrap();

        assert!(matrix.get("S1", "p1").unwrap().is_nan());
        assert!(matrix.get("S1", "p2").unwrap().is_nan());
    }

    #[test]
    fn test_transpose_rejects_non_numeric_cell() {
        let data = "Gene,S1\ng1,abc";
        let table = parse_table(Cursor::new(data), FileFormat::Csv).unwrap();
        let err = transpose(&table).unwrap_err();
        assert!(format!("{:#}", err).contains("g1"));
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("2.5").unwrap(), 2.5);
        assert_eq!(parse_cell(" 1 ").unwrap(), 1.0);
        assert!(parse_cell("NA").unwrap().is_nan());
        assert!(parse_cell("").unwrap().is_nan());
        assert!(parse_cell("x").is_err());
    }

    #[test]
    fn test_tsv_delimiter() {
        let data = "Gene\tS1\ng1\t7.5";
        let table = parse_table(Cursor::new(data), FileFormat::Tsv).unwrap();
        let matrix = transpose(&table).unwrap();
        assert_eq!(matrix.get("S1", "g1"), Some(7.5));
    }

    #[test]
    fn test_plain_tsv_and_gzipped_inputs_load_identically() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let csv_data = "Gene,S1,S2\ng1,1.0,2.0\ng2,3.0,4.0\n";
        let tsv_data = csv_data.replace(',', "\t");

        let dir = tempfile::TempDir::new().unwrap();
        let csv_path = dir.path().join("m.csv");
        let tsv_path = dir.path().join("m.tsv");
        let gz_path = dir.path().join("m.csv.gz");

        std::fs::write(&csv_path, csv_data).unwrap();
        std::fs::write(&tsv_path, tsv_data).unwrap();
        let mut encoder = GzEncoder::new(
            File::create(&gz_path).unwrap(),
            Compression::default(),
        );
        encoder.write_all(csv_data.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let from_csv = read_matrix(&csv_path).unwrap();
        assert_eq!(read_matrix(&tsv_path).unwrap(), from_csv);
        assert_eq!(read_matrix(&gz_path).unwrap(), from_csv);
    }

    #[test]
    fn test_gene_symbols_reject_conflicting_duplicates() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("genes.csv");
        std::fs::write(&path, "GENEID,SYMBOL\nENSG01,TP53\nENSG01,BRAF\n").unwrap();

        let err = read_gene_symbols(&path).unwrap_err();
        assert!(err.to_string().contains("Ambiguous"));
    }

    #[test]
    fn test_gene_symbols_allow_repeated_identical_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("genes.csv");
        std::fs::write(&path, "GENEID,SYMBOL\nENSG01,TP53\nENSG01,TP53\n").unwrap();

        let symbols = read_gene_symbols(&path).unwrap();
        assert_eq!(symbols.get("ENSG01"), Some(&"TP53".to_string()));
    }

    #[test]
    fn test_drug_names_keep_file_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("drug_names.csv");
        std::fs::write(&path, ",name\nD_002,idelalisib\nD_001,navitoclax\n").unwrap();

        let pairs = read_drug_names(&path).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("D_002".to_string(), "idelalisib".to_string()),
                ("D_001".to_string(), "navitoclax".to_string()),
            ]
        );
    }

    #[test]
    fn test_drug_names_require_name_column() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("drug_names.csv");
        std::fs::write(&path, ",label\nD_001,navitoclax\n").unwrap();

        let err = read_drug_names(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("name"));
    }

    #[test]
    fn test_missing_file_error_names_path() {
        let err = read_table("no/such/table.csv").unwrap_err();
        assert!(format!("{:#}", err).contains("table.csv"));
    }
}
