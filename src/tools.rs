//! Agent-facing tools.
//!
//! Each tool takes plain arguments and returns Markdown text. Errors never
//! escape: every failure becomes a message the orchestrating agent can relay
//! or act on (retry with another city, fewer pages, a different keyword).
//!
//! | Tool | Purpose |
//! |------|---------|
//! | [`scrape_listings`] | Scrape 51job for a keyword and city, save the dataset |
//! | [`read_local_jobs`] | Show records of a saved dataset |
//! | [`list_available_jobs`] | List saved datasets |

use crate::cities::split_city_arg;
use crate::config::{ScraperConfig, SinkFormat};
use crate::models::{ListingRecord, ScrapeOutcome};
use crate::outputs::reader::{find_dataset, list_datasets, read_listings};
use crate::outputs::sink::DATASET_SUFFIX;
use crate::scrapers::PageFetcher;
use crate::scrapers::job51::ListingScraper;
use std::path::Path;
use tracing::{error, instrument};

/// Default number of result pages fetched per call.
pub const DEFAULT_MAX_PAGES: usize = 3;

/// Default number of records shown by [`read_local_jobs`].
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Scrape 51job for `keyword` and save the listings.
///
/// `city` defaults to the configured city; it may name several cities
/// separated by `,` `，` `、` or `&`, and a blank string searches nationwide.
#[instrument(level = "info", skip(config))]
pub async fn scrape_listings(
    keyword: &str,
    city: Option<&str>,
    max_pages: usize,
    config: &ScraperConfig,
) -> String {
    match ListingScraper::from_config(config.clone()) {
        Ok(scraper) => scrape_listings_with(&scraper, keyword, city, max_pages).await,
        Err(e) => {
            error!(error = %e, "Could not set up the HTTP client");
            failure_message(&e.to_string())
        }
    }
}

/// [`scrape_listings`] against an existing scraper.
pub async fn scrape_listings_with<F: PageFetcher>(
    scraper: &ListingScraper<F>,
    keyword: &str,
    city: Option<&str>,
    max_pages: usize,
) -> String {
    let city_arg = city.unwrap_or(scraper.config().default_city.as_str());
    let cities = split_city_arg(city_arg);
    match scraper.scrape(keyword, &cities, max_pages).await {
        Ok(outcome) => render_outcome(&outcome),
        Err(e) => failure_message(&e.to_string()),
    }
}

fn failure_message(reason: &str) -> String {
    format!(
        "❌ Scrape failed: {reason}\n\nCheck the network connection and the arguments, then try again."
    )
}

/// Markdown summary of a scrape call.
pub fn render_outcome(outcome: &ScrapeOutcome) -> String {
    let mut out = String::new();
    let cities = if outcome.effective_cities.is_empty() {
        "全国".to_string()
    } else {
        outcome.effective_cities.join("、")
    };
    let saved = match (&outcome.output_path, &outcome.flush_error) {
        (Some(path), _) => format!("`{}`", path.display()),
        (None, Some(e)) => format!("save failed ({e})"),
        (None, None) => "nothing saved (no listings found)".to_string(),
    };

    out.push_str("## 📊 Scrape summary\n\n");
    out.push_str(&format!("**Keyword**: {}\n", outcome.keyword));
    out.push_str(&format!("**City**: {cities}\n"));
    out.push_str(&format!("**Pages fetched**: {}\n", outcome.pages_fetched));
    out.push_str(&format!("**Listings**: {}\n", outcome.record_count));
    if outcome.skipped_listings > 0 {
        out.push_str(&format!("**Skipped listings**: {}\n", outcome.skipped_listings));
    }
    out.push_str(&format!("**Stopped because**: {}\n", outcome.termination));
    out.push_str(&format!("\n**Saved to**: {saved}\n"));

    if !outcome.warnings.is_empty() {
        out.push_str("\n### ⚠️ Warnings\n");
        for warning in &outcome.warnings {
            out.push_str(&format!("- {warning}\n"));
        }
    }

    out.push_str("\n### 🔍 Fields\n");
    for (header, name) in ListingRecord::HEADERS.iter().zip(ListingRecord::SCHEMA) {
        out.push_str(&format!("- {header} ({name})\n"));
    }

    if outcome.output_path.is_some() {
        out.push_str(&format!(
            "\nUse `read_local_jobs(\"{}\")` to inspect the saved listings.\n",
            outcome.keyword
        ));
    }
    out
}

/// Show up to `max_results` records of the dataset saved for `keyword`.
///
/// `file_type` is `"excel"`/`"xlsx"` or `"csv"`.
#[instrument(level = "info", skip(config))]
pub fn read_local_jobs(
    keyword: &str,
    file_type: &str,
    max_results: usize,
    config: &ScraperConfig,
) -> String {
    let format = match file_type.trim().to_ascii_lowercase().as_str() {
        "excel" | "xlsx" => SinkFormat::Xlsx,
        "csv" => SinkFormat::Csv,
        other => return format!("Unsupported file type: {other}. Use 'excel' or 'csv'."),
    };
    let data_dir = &config.data_dir;

    let path = match find_dataset(data_dir, keyword, format) {
        Ok(Some(path)) => path,
        Ok(None) => return missing_dataset_message(keyword, data_dir, format),
        Err(e) => {
            return format!(
                "⚠️ Could not search {} for '{keyword}': {e}",
                data_dir.display()
            );
        }
    };

    let records = match read_listings(&path) {
        Ok(records) => records,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read dataset");
            return format!("❌ Failed to read {}: {e}", path.display());
        }
    };
    if records.is_empty() {
        return format!("File {} contains no listings.", path.display());
    }

    render_records(keyword, &path, &records, max_results)
}

fn missing_dataset_message(keyword: &str, data_dir: &Path, format: SinkFormat) -> String {
    format!(
        "⚠️ No dataset found for '{keyword}'.\n\n\
         Make sure that:\n\
         1. listings were scraped with `scrape_listings(\"{keyword}\", ...)`\n\
         2. the file is in `{}`\n\
         3. the file is named `{keyword}_<city>_{DATASET_SUFFIX}.{}`",
        data_dir.display(),
        format.extension()
    )
}

fn render_records(keyword: &str, path: &Path, records: &[ListingRecord], max_results: usize) -> String {
    let shown = &records[..records.len().min(max_results)];
    let mut out = String::new();

    out.push_str(&format!("## 📊 {} listings found\n\n", shown.len()));
    out.push_str(&format!("**Keyword**: {keyword}\n"));
    out.push_str(&format!("**File**: {}\n\n", path.display()));
    out.push_str("---\n\n");

    for (idx, record) in shown.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n\n", idx + 1, record.title));
        let fields = [
            ("Company", &record.company_name),
            ("Salary", &record.salary),
            ("Location", &record.location),
            ("Posted", &record.posted_at),
            ("Link", &record.listing_url),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                out.push_str(&format!("- **{label}**: {value}\n"));
            }
        }
        out.push('\n');
    }

    out.push_str("---\n\n");
    out.push_str(&format!("{} listings in file, {} shown.\n", records.len(), shown.len()));
    out
}

/// List every dataset in the configured data directory.
#[instrument(level = "info", skip_all)]
pub fn list_available_jobs(config: &ScraperConfig) -> String {
    let data_dir = &config.data_dir;
    if !data_dir.is_dir() {
        return format!(
            "⚠️ Data directory does not exist: {}\n\nRun `scrape_listings` first to create it.",
            data_dir.display()
        );
    }

    let entries = match list_datasets(data_dir) {
        Ok(entries) => entries,
        Err(e) => return format!("❌ Could not list {}: {e}", data_dir.display()),
    };
    if entries.is_empty() {
        return format!(
            "⚠️ No datasets in {}.\n\nRun `scrape_listings` to collect some.",
            data_dir.display()
        );
    }

    let mut out = String::new();
    out.push_str("## 📁 Available datasets\n\n");
    out.push_str(&format!("{} files found:\n\n", entries.len()));
    for entry in &entries {
        let keyword = entry.keyword();
        out.push_str(&format!("- **{}**\n", entry.file_name));
        out.push_str(&format!("  - Dataset: {}\n", entry.label));
        out.push_str(&format!("  - Query: `read_local_jobs(\"{keyword}\")`\n\n"));
    }
    out
}
