//! Data models for scraped listings and the state of a scrape run.
//!
//! - [`ListingRecord`]: one job posting as extracted from a result page
//! - [`ScrapeSession`]: the transient state of a single scrape call
//! - [`ScrapeOutcome`]: what a scrape call reports back to its caller
//! - [`Termination`]: why pagination stopped
//!
//! Column headers on disk are the Chinese labels the datasets have always
//! used, hence the `#[serde(rename)]` attributes.

use crate::outputs::sink::ListingSink;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Salary text used when a listing does not state one ("negotiable").
pub const SALARY_NEGOTIABLE: &str = "面议";

/// A single job posting scraped from a result page.
///
/// Only `title` is required; every other field degrades to `None` when the
/// markup does not carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListingRecord {
    /// The job title.
    #[serde(rename = "职位名称")]
    pub title: String,
    /// Link to the posting.
    #[serde(rename = "招聘链接")]
    pub listing_url: Option<String>,
    /// The hiring company.
    #[serde(rename = "公司名称")]
    pub company_name: Option<String>,
    /// Link to the company page.
    #[serde(rename = "公司链接")]
    pub company_url: Option<String>,
    /// Work location as displayed.
    #[serde(rename = "工作地点")]
    pub location: Option<String>,
    /// Salary as free text.
    #[serde(rename = "薪资")]
    pub salary: Option<String>,
    /// Posting date as free text; never parsed.
    #[serde(rename = "发布时间")]
    pub posted_at: Option<String>,
}

impl ListingRecord {
    /// Column headers in on-disk order.
    pub const HEADERS: [&'static str; 7] = [
        "职位名称",
        "招聘链接",
        "公司名称",
        "公司链接",
        "工作地点",
        "薪资",
        "发布时间",
    ];

    /// Human-readable names of the columns, in the same order as [`Self::HEADERS`].
    pub const SCHEMA: [&'static str; 7] = [
        "title",
        "listing URL",
        "company",
        "company URL",
        "location",
        "salary",
        "posted at",
    ];

    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Cell values in [`Self::HEADERS`] order; absent fields become empty cells.
    pub fn to_row(&self) -> [&str; 7] {
        [
            self.title.as_str(),
            self.listing_url.as_deref().unwrap_or_default(),
            self.company_name.as_deref().unwrap_or_default(),
            self.company_url.as_deref().unwrap_or_default(),
            self.location.as_deref().unwrap_or_default(),
            self.salary.as_deref().unwrap_or_default(),
            self.posted_at.as_deref().unwrap_or_default(),
        ]
    }

    /// Build a record from a row keyed by column header.
    ///
    /// Returns `None` when the title cell is missing or blank.
    pub fn from_cells<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Option<Self> {
        let cell = |header: &str| {
            lookup(header)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            title: cell(Self::HEADERS[0])?,
            listing_url: cell(Self::HEADERS[1]),
            company_name: cell(Self::HEADERS[2]),
            company_url: cell(Self::HEADERS[3]),
            location: cell(Self::HEADERS[4]),
            salary: cell(Self::HEADERS[5]),
            posted_at: cell(Self::HEADERS[6]),
        })
    }
}

/// Why the pagination loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Termination {
    /// The requested number of pages was fetched.
    PageLimit,
    /// A result page contained no listing elements.
    EmptyPage,
    /// There was no navigable next-page link.
    LastPage,
    /// A page fetch failed; pagination was abandoned.
    FetchFailed(String),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageLimit => write!(f, "page limit reached"),
            Self::EmptyPage => write!(f, "result page was empty"),
            Self::LastPage => write!(f, "last page reached"),
            Self::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
        }
    }
}

/// Transient state of one scrape call.
///
/// Created per call and dropped once its sink has been flushed. The sink
/// holds the records; the session only tracks pagination.
#[derive(Debug)]
pub struct ScrapeSession {
    pub keyword: String,
    /// Cities the data is scoped to; empty means nationwide.
    pub city_filter: Vec<String>,
    pub page_limit: usize,
    /// Zero-based index of the page about to be fetched.
    pub current_page: usize,
    /// Number of pages that were fetched successfully.
    pub pages_fetched: usize,
    /// Listing elements dropped because they could not be parsed.
    pub skipped_listings: usize,
    pub started_at: DateTime<Local>,
    pub sink: ListingSink,
}

impl ScrapeSession {
    pub fn new(
        keyword: &str,
        city_filter: Vec<String>,
        page_limit: usize,
        sink: ListingSink,
    ) -> Self {
        Self {
            keyword: keyword.to_string(),
            city_filter,
            page_limit,
            current_page: 0,
            pages_fetched: 0,
            skipped_listings: 0,
            started_at: Local::now(),
            sink,
        }
    }

    /// Whether another page may be fetched under the page limit.
    pub fn has_budget(&self) -> bool {
        self.current_page < self.page_limit
    }
}

/// The result of one scrape call.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub keyword: String,
    /// Cities as requested by the caller.
    pub requested_cities: Vec<String>,
    /// Cities the dataset was scoped to after resolution.
    pub effective_cities: Vec<String>,
    pub region_code: String,
    pub record_count: usize,
    /// Written file; `None` when nothing was saved or the flush failed.
    pub output_path: Option<PathBuf>,
    pub pages_fetched: usize,
    pub skipped_listings: usize,
    pub termination: Termination,
    pub warnings: Vec<String>,
    pub flush_error: Option<String>,
    /// The sink whose flush failed, records intact, so the caller can
    /// retry with [`ListingSink::flush_as`] (after
    /// [`ListingSink::relocate`] if the directory itself is the problem).
    #[serde(skip)]
    pub unsaved: Option<ListingSink>,
}
