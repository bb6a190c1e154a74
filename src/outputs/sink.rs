//! In-memory buffer of scraped listings with flush-to-file.
//!
//! One sink exists per scrape call. Its output path is derived once from the
//! keyword and the city filter and carries no timestamp, so re-running the
//! same search overwrites the previous dataset:
//!
//! ```text
//! assets/jobs_data/
//! ├── Python开发_深圳_招聘数据.xlsx
//! ├── 前端_全国_招聘数据.xlsx
//! └── 爬虫_深圳&武汉_招聘数据.csv
//! ```
//!
//! Both parts of the stem go through [`sanitize_file_component`], so a
//! keyword like `C/C++` lands in `C_C++_深圳_招聘数据.xlsx` inside `data_dir`.

use crate::cities::city_label;
use crate::config::SinkFormat;
use crate::error::Result;
use crate::models::ListingRecord;
use crate::utils::sanitize_file_component;
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Suffix every dataset file stem ends with ("recruitment data").
pub const DATASET_SUFFIX: &str = "招聘数据";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Buffers [`ListingRecord`]s for one scrape session and writes them out.
#[derive(Debug, Clone)]
pub struct ListingSink {
    records: Vec<ListingRecord>,
    data_dir: PathBuf,
    file_stem: String,
}

impl ListingSink {
    /// Create an empty sink scoped to `keyword` and `cities`.
    ///
    /// Nothing touches the filesystem until [`flush`](Self::flush).
    pub fn new<S: AsRef<str>>(keyword: &str, cities: &[S], data_dir: impl Into<PathBuf>) -> Self {
        let file_stem = format!(
            "{}_{}_{}",
            sanitize_file_component(keyword),
            sanitize_file_component(&city_label(cities)),
            DATASET_SUFFIX
        );
        Self {
            records: Vec::new(),
            data_dir: data_dir.into(),
            file_stem,
        }
    }

    /// Where a flush in `format` writes to.
    pub fn path_for(&self, format: SinkFormat) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", self.file_stem, format.extension()))
    }

    /// Point later flushes at another directory. The file name is unchanged.
    pub fn relocate(&mut self, data_dir: impl Into<PathBuf>) {
        self.data_dir = data_dir.into();
        info!(data_dir = %self.data_dir.display(), "Relocated listing sink");
    }

    pub fn insert(&mut self, record: ListingRecord) {
        self.records.push(record);
        debug!(count = self.records.len(), "Buffered listing");
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    /// Drop buffered records. Files already written are left alone.
    pub fn clear(&mut self) {
        self.records.clear();
        info!(file_stem = %self.file_stem, "Cleared listing buffer");
    }

    /// Write the buffer as xlsx.
    pub fn flush(&self) -> Result<Option<PathBuf>> {
        self.flush_as(SinkFormat::Xlsx)
    }

    /// Write the buffer in `format`.
    ///
    /// An empty buffer writes nothing and returns `Ok(None)`. The buffer is
    /// kept either way, so a failed flush can be retried.
    #[instrument(level = "info", skip(self), fields(file_stem = %self.file_stem, count = self.records.len()))]
    pub fn flush_as(&self, format: SinkFormat) -> Result<Option<PathBuf>> {
        if self.records.is_empty() {
            info!("No listings to save");
            return Ok(None);
        }

        fs::create_dir_all(&self.data_dir)?;
        let path = self.path_for(format);
        match format {
            SinkFormat::Xlsx => write_xlsx(&path, &self.records)?,
            SinkFormat::Csv => write_csv(&path, &self.records)?,
        }

        info!(path = %path.display(), rows = self.records.len(), "Saved listings");
        Ok(Some(path))
    }
}

fn write_xlsx(path: &Path, records: &[ListingRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in ListingRecord::HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in record.to_row().into_iter().enumerate() {
            if !cell.is_empty() {
                worksheet.write_string(row, col as u16, cell)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

// The BOM keeps spreadsheet apps on Chinese-locale systems from guessing GBK.
fn write_csv(path: &Path, records: &[ListingRecord]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::reader::read_listings;

    fn sample(n: usize) -> ListingRecord {
        ListingRecord {
            title: format!("数据分析师 {n}"),
            listing_url: Some(format!("https://jobs.51job.com/shenzhen/{n}.html")),
            company_name: Some("深圳市东健宇电子有限公司".to_string()),
            company_url: None,
            location: Some("深圳".to_string()),
            salary: Some("4.5-6千/月".to_string()),
            posted_at: Some("2024-01-15".to_string()),
        }
    }

    #[test]
    fn test_path_is_deterministic() {
        let a = ListingSink::new("爬虫", &["深圳", "武汉"], "/data");
        let b = ListingSink::new("爬虫", &["深圳", "武汉"], "/data");
        assert_eq!(a.path_for(SinkFormat::Xlsx), b.path_for(SinkFormat::Xlsx));
        assert_eq!(
            a.path_for(SinkFormat::Xlsx),
            PathBuf::from("/data/爬虫_深圳&武汉_招聘数据.xlsx")
        );
    }

    #[test]
    fn test_path_for_nationwide_and_csv() {
        let none: [&str; 0] = [];
        let sink = ListingSink::new("前端", &none, "out");
        assert_eq!(
            sink.path_for(SinkFormat::Csv),
            PathBuf::from("out/前端_全国_招聘数据.csv")
        );
    }

    #[test]
    fn test_empty_flush_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("jobs_data");
        let sink = ListingSink::new("Python", &["深圳"], &data_dir);

        assert_eq!(sink.flush().unwrap(), None);
        assert_eq!(sink.flush_as(SinkFormat::Csv).unwrap(), None);
        assert!(!data_dir.exists());
    }

    #[test]
    fn test_insert_count_clear() {
        let mut sink = ListingSink::new("Python", &["深圳"], "unused");
        sink.insert(sample(1));
        sink.insert(sample(1));
        assert_eq!(sink.count(), 2);
        sink.clear();
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_xlsx_flush_writes_all_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("jobs_data");
        let mut sink = ListingSink::new("数据分析师", &["北京"], &data_dir);
        for n in 0..4 {
            sink.insert(sample(n));
        }

        let path = sink.flush().unwrap().unwrap();
        assert!(path.exists());
        assert!(path.ends_with("数据分析师_北京_招聘数据.xlsx"));

        let back = read_listings(&path).unwrap();
        assert_eq!(back, sink.records());
    }

    #[test]
    fn test_csv_flush_has_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ListingSink::new("Java", &["上海"], dir.path());
        sink.insert(sample(1));
        sink.insert(sample(2));
        sink.insert(ListingRecord::new("只有标题"));

        let path = sink.flush_as(SinkFormat::Csv).unwrap().unwrap();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], ListingRecord::HEADERS.join(","));

        let back = read_listings(&path).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[2], ListingRecord::new("只有标题"));
    }

    #[test]
    fn test_clear_keeps_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ListingSink::new("Go", &["杭州"], dir.path());
        sink.insert(sample(1));
        let path = sink.flush_as(SinkFormat::Csv).unwrap().unwrap();

        sink.clear();
        assert!(path.exists());
    }

    #[test]
    fn test_keyword_with_separators_stays_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("jobs_data");

        let mut sink = ListingSink::new("C/C++", &["深圳"], &data_dir);
        sink.insert(sample(1));
        let path = sink.flush().unwrap().unwrap();
        assert_eq!(path, data_dir.join("C_C++_深圳_招聘数据.xlsx"));
        assert!(path.exists());

        let mut sink = ListingSink::new("../../escape", &["深圳"], &data_dir);
        sink.insert(sample(2));
        let path = sink.flush_as(SinkFormat::Csv).unwrap().unwrap();
        assert_eq!(path.parent(), Some(data_dir.as_path()));
        assert!(path.exists());
        assert!(!dir.path().join("escape_深圳_招聘数据.csv").exists());
    }

    #[test]
    fn test_failed_flush_keeps_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "x").unwrap();

        let mut sink = ListingSink::new("Rust", &["深圳"], &blocker);
        sink.insert(sample(1));
        assert!(sink.flush().is_err());
        assert_eq!(sink.count(), 1);

        sink.relocate(dir.path().join("jobs_data"));
        let path = sink.flush().unwrap().unwrap();
        assert_eq!(path, dir.path().join("jobs_data").join("Rust_深圳_招聘数据.xlsx"));
        assert_eq!(read_listings(&path).unwrap().len(), 1);
    }
}
