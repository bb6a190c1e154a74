//! Runtime configuration for the scraper and the dataset directory.
//!
//! Defaults reproduce the behaviour the tools have always had. A YAML file
//! can override any subset of fields:
//!
//! ```yaml
//! data_dir: ./assets/jobs_data
//! page_delay_ms: 2000
//! default_city: 北京
//! output_format: csv
//! ```

use crate::error::{Result, ScrapeError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// On-disk encoding of a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    #[default]
    Xlsx,
    Csv,
}

impl SinkFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

/// Settings for fetching result pages and persisting datasets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Search endpoint; query parameters are appended to it.
    pub search_url: String,
    pub user_agent: String,
    /// `Host` header sent with every request; `None` lets the client derive
    /// it from the URL.
    pub host_header: Option<String>,
    /// Label of the encoding result pages are decoded with, whatever the
    /// response headers claim.
    pub response_encoding: String,
    pub timeout_secs: u64,
    /// Politeness delay between page fetches.
    pub page_delay_ms: u64,
    pub data_dir: PathBuf,
    /// City used when none of the requested cities is known.
    pub default_city: String,
    pub output_format: SinkFormat,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            search_url: "http://search.51job.com/jobsearch/search_result.php".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            host_header: Some("search.51job.com".to_string()),
            response_encoding: "gbk".to_string(),
            timeout_secs: 10,
            page_delay_ms: 1000,
            data_dir: PathBuf::from("assets/jobs_data"),
            default_city: "深圳".to_string(),
            output_format: SinkFormat::Xlsx,
        }
    }
}

impl ScraperConfig {
    /// Load a YAML config file, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw).map_err(|source| ScrapeError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded scraper configuration");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.page_delay(), Duration::from_secs(1));
        assert_eq!(config.data_dir, PathBuf::from("assets/jobs_data"));
        assert_eq!(config.default_city, "深圳");
        assert_eq!(config.output_format, SinkFormat::Xlsx);
        assert_eq!(config.host_header.as_deref(), Some("search.51job.com"));
    }

    #[test]
    fn test_load_without_path_gives_defaults() {
        let config = ScraperConfig::load(None).unwrap();
        assert_eq!(config.response_encoding, "gbk");
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_delay_ms: 250\noutput_format: csv\ndefault_city: 北京").unwrap();

        let config = ScraperConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.page_delay_ms, 250);
        assert_eq!(config.output_format, SinkFormat::Csv);
        assert_eq!(config.default_city, "北京");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.host_header.as_deref(), Some("search.51job.com"));
    }

    #[test]
    fn test_load_can_unset_host_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host_header: null").unwrap();

        let config = ScraperConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.host_header, None);
    }

    #[test]
    fn test_load_rejects_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_delay_ms: [not, a, number]").unwrap();

        let err = ScraperConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ScrapeError::Config { .. }));
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(SinkFormat::Xlsx.extension(), "xlsx");
        assert_eq!(SinkFormat::Csv.extension(), "csv");
    }
}
