//! # Job Scout CLI
//!
//! Runs the agent tools by hand: scrape 51job listings into the data
//! directory, list saved datasets, or print the listings of one.
//!
//! ## Usage
//!
//! ```sh
//! job_scout scrape Python开发 -c 深圳 -p 2
//! job_scout list
//! job_scout read Python开发
//! ```

use clap::Parser;
use job_scout::cities::split_city_arg;
use job_scout::tools::{list_available_jobs, read_local_jobs, render_outcome};
use job_scout::{ListingScraper, ScraperConfig, SinkFormat};
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("job_scout starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.data_dir, "Parsed CLI arguments");

    let mut config = ScraperConfig::load(args.config.as_deref())?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    match args.command {
        Command::Scrape {
            keyword,
            cities,
            nationwide,
            max_pages,
            format,
        } => {
            if let Some(format) = format {
                config.output_format = format;
            }
            if let Err(e) = job_scout::utils::ensure_writable_dir(&config.data_dir) {
                error!(
                    path = %config.data_dir.display(),
                    error = %e,
                    "Data directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }

            let cities = match (nationwide, cities.is_empty()) {
                (true, _) => Vec::new(),
                (false, true) => split_city_arg(&config.default_city),
                (false, false) => cities.iter().flat_map(|c| split_city_arg(c)).collect(),
            };

            let scraper = ListingScraper::from_config(config)?;
            let outcome = scraper.scrape(&keyword, &cities, max_pages).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", render_outcome(&outcome));
            }
        }
        Command::Read {
            keyword,
            format,
            max_results,
        } => {
            let file_type = match format {
                SinkFormat::Xlsx => "excel",
                SinkFormat::Csv => "csv",
            };
            println!("{}", read_local_jobs(&keyword, file_type, max_results, &config));
        }
        Command::List => {
            println!("{}", list_available_jobs(&config));
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
