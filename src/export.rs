use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::pipeline::MatchResult;

pub const COLUMNS: [&str; 5] = ["Brand", "Keyword", "Site", "Product URL", "Scraped At"];
const FILE_PREFIX: &str = "b2b_scraper_results";
const SHEET_NAME: &str = "Results";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Both,
}

impl ExportFormat {
    fn includes_csv(self) -> bool {
        matches!(self, ExportFormat::Csv | ExportFormat::Both)
    }

    fn includes_xlsx(self) -> bool {
        matches!(self, ExportFormat::Xlsx | ExportFormat::Both)
    }
}

/// `b2b_scraper_results_YYYYmmdd_HHMMSS`
pub fn file_stem(at: NaiveDateTime) -> String {
    format!("{}_{}", FILE_PREFIX, at.format("%Y%m%d_%H%M%S"))
}

/// Writes the requested files into `dir`, returning their paths.
pub fn export_all(
    rows: &[MatchResult],
    dir: &Path,
    format: ExportFormat,
    at: NaiveDateTime,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let stem = file_stem(at);
    let mut written = Vec::new();

    if format.includes_xlsx() {
        let path = dir.join(format!("{stem}.xlsx"));
        export_xlsx(rows, &path)?;
        written.push(path);
    }
    if format.includes_csv() {
        let path = dir.join(format!("{stem}.csv"));
        export_csv(rows, &path)?;
        written.push(path);
    }

    Ok(written)
}

pub fn export_csv(rows: &[MatchResult], path: &Path) -> Result<(), ExportError> {
    debug!("Exporting {} rows to CSV: {}", rows.len(), path.display());

    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(rows, file)?;

    info!("Exported {} rows to CSV: {}", rows.len(), path.display());
    Ok(())
}

pub fn write_csv<W: Write>(rows: &[MatchResult], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    // serde only emits a header alongside the first record.
    if rows.is_empty() {
        wtr.write_record(COLUMNS)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Parses a CSV produced by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<MatchResult>, ExportError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let rows = rdr.deserialize().collect::<Result<Vec<MatchResult>, _>>()?;
    Ok(rows)
}

pub fn export_xlsx(rows: &[MatchResult], path: &Path) -> Result<(), ExportError> {
    debug!("Exporting {} rows to XLSX: {}", rows.len(), path.display());

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, &row.brand)?;
        sheet.write_string(r, 1, &row.keyword)?;
        sheet.write_string(r, 2, &row.site)?;
        sheet.write_string(r, 3, &row.product_url)?;
        sheet.write_string(r, 4, row.scraped_at_text())?;
    }

    sheet.set_column_width(3, 80)?;
    sheet.set_column_width(4, 20)?;

    workbook.save(path)?;
    info!("Exported {} rows to XLSX: {}", rows.len(), path.display());
    Ok(())
}
