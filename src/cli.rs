//! Command-line interface definitions for Job Scout.
//!
//! Global options can also come from environment variables; subcommands map
//! one-to-one onto the agent tools.

use clap::{Parser, Subcommand};
use job_scout::SinkFormat;
use job_scout::tools::{DEFAULT_MAX_PAGES, DEFAULT_MAX_RESULTS};
use std::path::PathBuf;

/// Command-line arguments for the Job Scout application.
///
/// # Examples
///
/// ```sh
/// # Two pages of Python jobs in Shenzhen
/// job_scout scrape Python开发 -c 深圳 -p 2
///
/// # Several cities, CSV output, custom data directory
/// job_scout --data-dir ./data scrape 数据分析师 -c 北京 -c 上海 --format csv
///
/// # Inspect what was saved
/// job_scout list
/// job_scout read Python开发 -n 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "JOB_SCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory datasets are written to and read from (overrides config)
    #[arg(short, long, env = "JOBS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print the scrape outcome as JSON instead of Markdown
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape listings for a keyword and save them
    Scrape {
        /// Search keyword, e.g. "Python开发"
        keyword: String,

        /// City name; repeat for several cities (default from config)
        #[arg(short, long = "city")]
        cities: Vec<String>,

        /// Search all of China instead of specific cities
        #[arg(long, conflicts_with = "cities")]
        nationwide: bool,

        /// Maximum number of result pages to fetch
        #[arg(short = 'p', long, default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: usize,

        /// Output format (overrides config)
        #[arg(short, long, value_enum)]
        format: Option<SinkFormat>,
    },

    /// Show listings from a saved dataset
    Read {
        /// Keyword the dataset was scraped for
        keyword: String,

        #[arg(short, long, value_enum, default_value_t = SinkFormat::Xlsx)]
        format: SinkFormat,

        /// Maximum number of listings to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },

    /// List saved datasets
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_scrape_parsing() {
        let cli = Cli::parse_from([
            "job_scout",
            "scrape",
            "Python开发",
            "-c",
            "深圳",
            "--city",
            "武汉",
            "-p",
            "2",
        ]);

        match cli.command {
            Command::Scrape {
                keyword,
                cities,
                nationwide,
                max_pages,
                format,
            } => {
                assert_eq!(keyword, "Python开发");
                assert_eq!(cities, vec!["深圳", "武汉"]);
                assert!(!nationwide);
                assert_eq!(max_pages, 2);
                assert_eq!(format, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_scrape_defaults() {
        let cli = Cli::parse_from(["job_scout", "scrape", "前端"]);
        match cli.command {
            Command::Scrape { cities, max_pages, .. } => {
                assert!(cities.is_empty());
                assert_eq!(max_pages, DEFAULT_MAX_PAGES);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_nationwide_conflicts_with_city() {
        let res = Cli::try_parse_from(["job_scout", "scrape", "前端", "--nationwide", "-c", "深圳"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_cli_read_and_globals() {
        let cli = Cli::parse_from([
            "job_scout",
            "--data-dir",
            "/tmp/jobs",
            "read",
            "Java",
            "--format",
            "csv",
            "-n",
            "5",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/jobs")));
        match cli.command {
            Command::Read {
                keyword,
                format,
                max_results,
            } => {
                assert_eq!(keyword, "Java");
                assert_eq!(format, SinkFormat::Csv);
                assert_eq!(max_results, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_list() {
        let cli = Cli::parse_from(["job_scout", "list"]);
        assert!(matches!(cli.command, Command::List));
    }
}
