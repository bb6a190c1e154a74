//! Reading persisted datasets back from the data directory.
//!
//! Columns are matched by header name, so files edited by hand (reordered or
//! extra columns) still load. Rows without a title are skipped.

use crate::config::SinkFormat;
use crate::error::{Result, ScrapeError};
use crate::models::ListingRecord;
use crate::outputs::sink::DATASET_SUFFIX;
use crate::utils::sanitize_file_component;
use calamine::{Reader, open_workbook_auto};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, instrument};

/// A dataset file found in the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub file_name: String,
    /// File name without the `_招聘数据.<ext>` suffix, e.g. `Python开发_深圳`.
    pub label: String,
    pub path: PathBuf,
}

impl DatasetEntry {
    /// Keyword the dataset was saved under.
    ///
    /// City labels never contain `_`, so only the last `_` separates the
    /// keyword from the cities; keywords themselves may contain `_`.
    pub fn keyword(&self) -> &str {
        self.label
            .rsplit_once('_')
            .map_or(self.label.as_str(), |(keyword, _)| keyword)
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn is_tabular(path: &Path) -> bool {
    matches!(extension_of(path).as_deref(), Some("xlsx" | "xls" | "csv"))
}

fn matches_format(path: &Path, format: SinkFormat) -> bool {
    match (format, extension_of(path).as_deref()) {
        (SinkFormat::Xlsx, Some("xlsx" | "xls")) => true,
        (SinkFormat::Csv, Some("csv")) => true,
        _ => false,
    }
}

fn label_for(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem);
    stem.strip_suffix(DATASET_SUFFIX)
        .map(|s| s.trim_end_matches('_'))
        .unwrap_or(stem)
        .to_string()
}

/// All spreadsheet and CSV files in `data_dir`, sorted by file name.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.display()))]
pub fn list_datasets(data_dir: &Path) -> Result<Vec<DatasetEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_tabular(&path) {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        entries.push(DatasetEntry {
            label: label_for(file_name),
            file_name: file_name.to_string(),
            path: path.clone(),
        });
    }
    entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    info!(count = entries.len(), "Listed datasets");
    Ok(entries)
}

/// Find the dataset for `keyword` in `format`.
///
/// Matches `<keyword>_招聘数据.<ext>` as well as any city-scoped
/// `<keyword>_<cities>_招聘数据.<ext>`; the most recently modified wins.
/// The keyword is sanitized the way the sink sanitized it when saving.
pub fn find_dataset(data_dir: &Path, keyword: &str, format: SinkFormat) -> Result<Option<PathBuf>> {
    let keyword = sanitize_file_component(keyword);
    let exact = format!("{keyword}_{DATASET_SUFFIX}");
    let prefix = format!("{keyword}_");
    let suffix = format!("_{DATASET_SUFFIX}");

    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in list_datasets(data_dir)? {
        if !matches_format(&entry.path, format) {
            continue;
        }
        let stem = entry
            .file_name
            .rsplit_once('.')
            .map_or(entry.file_name.as_str(), |(stem, _)| stem);
        if stem != exact && !(stem.starts_with(&prefix) && stem.ends_with(&suffix)) {
            continue;
        }
        let modified = fs::metadata(&entry.path)?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if best.as_ref().is_none_or(|(t, _)| modified >= *t) {
            best = Some((modified, entry.path));
        }
    }

    debug!(%keyword, found = ?best.as_ref().map(|(_, p)| p), "Dataset lookup");
    Ok(best.map(|(_, path)| path))
}

/// Load the records of a CSV or spreadsheet dataset.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_listings(path: &Path) -> Result<Vec<ListingRecord>> {
    let records = match extension_of(path).as_deref() {
        Some("csv") => read_csv(path)?,
        Some("xlsx" | "xls") => read_spreadsheet(path)?,
        other => {
            return Err(ScrapeError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            ));
        }
    };
    info!(count = records.len(), "Read listings");
    Ok(records)
}

fn read_csv(path: &Path) -> Result<Vec<ListingRecord>> {
    let raw = fs::read_to_string(path)?;
    let body = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record = ListingRecord::from_cells(|header| {
            headers
                .iter()
                .position(|h| h == header)
                .and_then(|idx| row.get(idx))
        });
        records.extend(record);
    }
    Ok(records)
}

fn read_spreadsheet(path: &Path) -> Result<Vec<ListingRecord>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ScrapeError::Parse(format!("{} has no worksheets", path.display())))??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
        let record = ListingRecord::from_cells(|header| {
            headers
                .iter()
                .position(|h| h == header)
                .and_then(|idx| cells.get(idx))
                .map(String::as_str)
        });
        records.extend(record);
    }
    Ok(records)
}
