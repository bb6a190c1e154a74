//! # Job Scout
//!
//! Job listing collection for a career-guidance agent. Scrapes the 51job
//! (前程无忧) search results for a keyword and city, turns each result row
//! into a [`ListingRecord`], and saves the listings as a spreadsheet dataset
//! the agent can read back later.
//!
//! ## Architecture
//!
//! 1. **Resolve**: city names become a 51job region code ([`cities`])
//! 2. **Paginate**: result pages are fetched one at a time with a politeness
//!    delay, each row parsed in isolation ([`scrapers::job51`])
//! 3. **Buffer and flush**: rows accumulate in a [`ListingSink`] and are
//!    written to `<keyword>_<cities>_招聘数据.xlsx` (or `.csv`) ([`outputs`])
//! 4. **Report**: the agent receives Markdown text, never an error ([`tools`])
//!
//! ## Usage
//!
//! ```no_run
//! # async fn run() {
//! use job_scout::{ScraperConfig, tools};
//!
//! let config = ScraperConfig::default();
//! let summary = tools::scrape_listings("Python开发", Some("深圳"), 2, &config).await;
//! println!("{summary}");
//! # }
//! ```

pub mod cities;
pub mod config;
pub mod error;
pub mod models;
pub mod outputs;
pub mod scrapers;
pub mod tools;
pub mod utils;

pub use config::{ScraperConfig, SinkFormat};
pub use error::{Result, ScrapeError};
pub use models::{ListingRecord, ScrapeOutcome, ScrapeSession, Termination};
pub use outputs::sink::ListingSink;
pub use scrapers::job51::ListingScraper;
pub use scrapers::{HttpFetcher, PageFetcher};
