//! Error type shared by the scraper, the sink and the dataset reader.
//!
//! Library functions return [`ScrapeError`] and propagate with `?`. Only the
//! tool layer in [`crate::tools`] turns these into text for the caller.

use std::path::PathBuf;

/// Everything that can go wrong while scraping, persisting or reading listings.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Connection error, timeout or body read failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The site answered with a non-success status.
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// A URL could not be built or joined.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// A page or listing element did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Caller supplied arguments that cannot start a scrape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the xlsx workbook failed.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Reading a spreadsheet back failed.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The YAML configuration file could not be parsed.
    #[error("Config error in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The file extension is not one of the supported tabular formats.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
