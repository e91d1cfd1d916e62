use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const BRAND_COLUMN: &str = "Brand";
pub const KEYWORD_MARKER: &str = "Keyword";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV must have a 'Brand' column")]
    MissingBrandColumn,
    #[error("CSV must have at least one 'Keyword' column")]
    MissingKeywordColumns,
}

/// One brand to protect and the keywords to search it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandRecord {
    pub brand: String,
    pub keywords: Vec<String>,
}

impl BrandRecord {
    pub fn new(
        brand: impl Into<String>,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            brand: brand.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BrandTable {
    pub records: Vec<BrandRecord>,
    pub keyword_columns: Vec<String>,
    /// Data rows in the file, including skipped ones.
    pub rows_read: usize,
}

pub fn load_brands(path: &Path) -> Result<BrandTable, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_brands(file)
}

/// Reads a `Brand, Keyword1, Keyword2, ...` table.
///
/// Every column whose header contains "Keyword" contributes, in column order.
/// Empty keyword cells are skipped; rows left without a brand or any keyword
/// are dropped.
pub fn parse_brands<R: Read>(reader: R) -> Result<BrandTable, InputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let brand_idx = headers
        .iter()
        .position(|h| h == BRAND_COLUMN)
        .ok_or(InputError::MissingBrandColumn)?;
    let keyword_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.contains(KEYWORD_MARKER))
        .map(|(i, _)| i)
        .collect();
    if keyword_idx.is_empty() {
        return Err(InputError::MissingKeywordColumns);
    }

    let mut table = BrandTable {
        keyword_columns: keyword_idx
            .iter()
            .map(|&i| headers[i].to_string())
            .collect(),
        ..Default::default()
    };

    for (line, row) in csv_reader.records().enumerate() {
        let row = row?;
        table.rows_read += 1;

        let brand = row.get(brand_idx).unwrap_or_default();
        let keywords: Vec<String> = keyword_idx
            .iter()
            .filter_map(|&i| row.get(i))
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect();

        if brand.is_empty() {
            warn!(row = line + 1, "Skipping row without a brand");
            continue;
        }
        if keywords.is_empty() {
            warn!(row = line + 1, brand, "Skipping brand without keywords");
            continue;
        }

        debug!(brand, keywords = keywords.len(), "Loaded brand");
        table.records.push(BrandRecord::new(brand, keywords));
    }

    Ok(table)
}
