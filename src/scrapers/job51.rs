//! 51job (前程无忧) search result scraper.
//!
//! Walks the paginated result list for a keyword and region, turning each
//! `#resultList > div.el` row into a [`ListingRecord`] and pushing it into the
//! session's [`ListingSink`]. The first `div.el` is the column header row of
//! the result table and is skipped.
//!
//! # Row Markup
//!
//! ```text
//! div.el
//! ├── p.t1 > span > a[href]   title + listing link   (required)
//! ├── span.t2 > a[href]       company + company link
//! ├── span.t3                 location
//! ├── span.t4                 salary (defaults to 面议)
//! └── span.t5                 posted at
//! ```
//!
//! # Termination
//!
//! Pagination stops at the page limit, on a page with no rows, when the last
//! `li.bk` pager item has no link or a `javascript:` link, or on the first
//! failed fetch. Whatever was collected is flushed in every case.

use crate::cities::{self, NATIONWIDE_CODE};
use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::models::{ListingRecord, SALARY_NEGOTIABLE, ScrapeOutcome, ScrapeSession, Termination};
use crate::outputs::sink::ListingSink;
use crate::scrapers::{HttpFetcher, PageFetcher};
use crate::utils::{clean_text, truncate_for_log};
use chrono::Local;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

static RESULT_ROWS: Lazy<Selector> = Lazy::new(|| Selector::parse("#resultList > div.el").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("p.t1").unwrap());
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("span > a").unwrap());
static COMPANY: Lazy<Selector> = Lazy::new(|| Selector::parse("span.t2").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static LOCATION: Lazy<Selector> = Lazy::new(|| Selector::parse("span.t3").unwrap());
static SALARY: Lazy<Selector> = Lazy::new(|| Selector::parse("span.t4").unwrap());
static POSTED_AT: Lazy<Selector> = Lazy::new(|| Selector::parse("span.t5").unwrap());
static PAGER_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li.bk").unwrap());

/// Build the first result page URL for `keyword` in `region_code`.
pub fn build_search_url(search_url: &str, keyword: &str, region_code: &str) -> Result<Url> {
    let url = format!(
        "{search_url}?fromJs=1&jobarea={}&keyword={}&keywordtype=2&lang=c&stype=2&postchannel=0000&fromType=1&confirmdate=9",
        urlencoding::encode(region_code),
        urlencoding::encode(keyword),
    );
    Ok(Url::parse(&url)?)
}

/// Listings and pagination info extracted from one result page.
#[derive(Debug, Default)]
pub struct ParsedPage {
    pub records: Vec<ListingRecord>,
    /// Number of listing rows found, header row excluded.
    pub listing_elements: usize,
    /// Rows that could not be turned into a record.
    pub skipped: usize,
    /// Absolute URL of the next page, when there is one.
    pub next_url: Option<Url>,
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn first_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector).next().map(element_text).and_then(non_empty)
}

fn link_in(element: ElementRef<'_>, selector: &Selector, base: &Url) -> Option<String> {
    let href = element.select(selector).next()?.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    Some(base.join(href).map_or_else(|_| href.to_string(), String::from))
}

/// Parse a single `div.el` row. Only a missing or blank title is an error.
pub fn parse_listing(row: ElementRef<'_>, base: &Url) -> Result<ListingRecord> {
    let title_el = row
        .select(&TITLE)
        .next()
        .ok_or_else(|| ScrapeError::Parse("listing has no p.t1 title".to_string()))?;
    let title = element_text(title_el);
    if title.is_empty() {
        return Err(ScrapeError::Parse("listing title is blank".to_string()));
    }

    let company_el = row.select(&COMPANY).next();
    Ok(ListingRecord {
        title,
        listing_url: link_in(title_el, &TITLE_LINK, base),
        company_name: company_el.map(element_text).and_then(non_empty),
        company_url: company_el.and_then(|el| link_in(el, &ANCHOR, base)),
        location: first_text(row, &LOCATION),
        salary: Some(first_text(row, &SALARY).unwrap_or_else(|| SALARY_NEGOTIABLE.to_string())),
        posted_at: first_text(row, &POSTED_AT),
    })
}

/// Locate the next page link in the last `li.bk` pager item.
fn next_page_url(document: &Html, page_url: &Url) -> Option<Url> {
    let pager = document.select(&PAGER_ITEM).last()?;
    let href = pager.select(&ANCHOR).next()?.value().attr("href")?.trim();
    if href.is_empty() || href.to_ascii_lowercase().contains("javascript:") {
        return None;
    }
    page_url.join(href).ok()
}

/// Parse a result page body fetched from `page_url`.
///
/// Rows that fail to parse are logged and counted in [`ParsedPage::skipped`];
/// they never abort the page.
pub fn parse_page(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);
    let mut page = ParsedPage::default();

    for row in document.select(&RESULT_ROWS).skip(1) {
        page.listing_elements += 1;
        match parse_listing(row, page_url) {
            Ok(record) => page.records.push(record),
            Err(e) => {
                page.skipped += 1;
                warn!(
                    error = %e,
                    row = %truncate_for_log(&row.html(), 200),
                    "Skipping unparseable listing"
                );
            }
        }
    }

    page.next_url = next_page_url(&document, page_url);
    page
}

/// Drives pagination against 51job and persists what it finds.
#[derive(Debug)]
pub struct ListingScraper<F> {
    fetcher: F,
    config: ScraperConfig,
}

impl ListingScraper<HttpFetcher> {
    /// A scraper that fetches over HTTP with the settings in `config`.
    pub fn from_config(config: ScraperConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(fetcher, config))
    }
}

impl<F: PageFetcher> ListingScraper<F> {
    pub fn new(fetcher: F, config: ScraperConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape up to `page_limit` result pages for `keyword` in `city_names`
    /// and flush the listings to the data directory.
    ///
    /// Only invalid arguments are returned as `Err`. Unknown cities, failed
    /// fetches and failed flushes are reported inside the [`ScrapeOutcome`].
    #[instrument(level = "info", skip(self))]
    pub async fn scrape(
        &self,
        keyword: &str,
        city_names: &[String],
        page_limit: usize,
    ) -> Result<ScrapeOutcome> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ScrapeError::InvalidInput("keyword must not be empty".to_string()));
        }
        if page_limit == 0 {
            return Err(ScrapeError::InvalidInput("page limit must be at least 1".to_string()));
        }

        let requested: Vec<String> = city_names
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        let mut warnings = Vec::new();
        let (region_code, effective_cities) = self.resolve_region(&requested, &mut warnings);

        let sink = ListingSink::new(keyword, &effective_cities, &self.config.data_dir);
        let mut session = ScrapeSession::new(keyword, effective_cities, page_limit, sink);
        info!(
            %region_code,
            cities = ?session.city_filter,
            started_at = %session.started_at.format("%Y%m%d_%H%M"),
            "Starting scrape session"
        );

        let termination = match build_search_url(&self.config.search_url, keyword, &region_code) {
            Ok(url) => self.paginate(&mut session, url).await,
            Err(e) => {
                error!(error = %e, "Could not build search URL");
                Termination::FetchFailed(e.to_string())
            }
        };

        let (output_path, flush_error) = match session.sink.flush_as(self.config.output_format) {
            Ok(path) => (path, None),
            Err(e) => {
                error!(error = %e, "Failed to save listings; returning them unsaved");
                (None, Some(e.to_string()))
            }
        };
        let record_count = session.sink.count();

        let elapsed = Local::now() - session.started_at;
        info!(
            records = session.sink.count(),
            pages = session.pages_fetched,
            skipped = session.skipped_listings,
            %termination,
            elapsed_ms = elapsed.num_milliseconds(),
            "Scrape session finished"
        );

        Ok(ScrapeOutcome {
            keyword: session.keyword,
            requested_cities: requested,
            effective_cities: session.city_filter,
            region_code,
            record_count,
            output_path,
            pages_fetched: session.pages_fetched,
            skipped_listings: session.skipped_listings,
            termination,
            unsaved: flush_error.is_some().then_some(session.sink),
            warnings,
            flush_error,
        })
    }

    /// Pick the region code and the cities the dataset is labelled with.
    ///
    /// When nothing resolves, the configured default city stands in, and the
    /// dataset is labelled with it since that is what the listings describe.
    fn resolve_region(&self, requested: &[String], warnings: &mut Vec<String>) -> (String, Vec<String>) {
        if let Some(code) = cities::resolve(requested) {
            let (known, unknown): (Vec<String>, Vec<String>) = requested
                .iter()
                .unique()
                .cloned()
                .partition(|c| cities::code_for(c).is_some());
            if !unknown.is_empty() {
                warnings.push(format!("Ignored unknown cities: {}", unknown.join("、")));
            }
            return (code, known);
        }

        let fallback = self.config.default_city.clone();
        warn!(requested = ?requested, %fallback, "No requested city matched; using default city");
        warnings.push(format!(
            "Could not match city 【{}】; using default city 【{}】",
            requested.iter().join("、"),
            fallback
        ));
        match cities::code_for(&fallback) {
            Some(code) => (code.to_string(), vec![fallback]),
            None => {
                warnings.push(format!(
                    "Default city 【{fallback}】 is unknown as well; searching nationwide"
                ));
                (NATIONWIDE_CODE.to_string(), Vec::new())
            }
        }
    }

    async fn paginate(&self, session: &mut ScrapeSession, start: Url) -> Termination {
        let mut url = start;

        while session.has_budget() {
            let page_no = session.current_page + 1;
            info!(page = page_no, %url, "Fetching result page");

            let body = match self.fetcher.fetch(url.as_str()).await {
                Ok(body) => body,
                Err(e) => {
                    error!(page = page_no, error = %e, "Fetch failed; stopping pagination");
                    return Termination::FetchFailed(e.to_string());
                }
            };
            session.pages_fetched += 1;

            let page = parse_page(&body, &url);
            if page.listing_elements == 0 {
                info!(page = page_no, "No listings on page; stopping");
                return Termination::EmptyPage;
            }

            let parsed = page.records.len();
            session.skipped_listings += page.skipped;
            for record in page.records {
                session.sink.insert(record);
            }
            info!(
                page = page_no,
                parsed,
                skipped = page.skipped,
                total = session.sink.count(),
                "Parsed result page"
            );

            let Some(next) = page.next_url else {
                info!(page = page_no, "No next page link; stopping");
                return Termination::LastPage;
            };
            debug!(next = %next, "Next page");
            url = next;
            session.current_page += 1;

            if session.has_budget() {
                sleep(self.config.page_delay()).await;
            }
        }

        Termination::PageLimit
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Result page markup shaped like 51job's, for tests.

    pub fn listing(n: usize) -> String {
        format!(
            r#"<div class="el">
                <p class="t1 "><em class="check"></em><span>
                    <a target="_blank" title="Python开发工程师{n}" href="https://jobs.51job.com/shenzhen/{n}.html">
                        Python开发工程师{n}
                    </a></span></p>
                <span class="t2"><a target="_blank" href="https://jobs.51job.com/all/co{n}.html">深圳市科技有限公司{n}</a></span>
                <span class="t3">深圳-南山区</span>
                <span class="t4">1-1.5万/月</span>
                <span class="t5">06-0{}</span>
            </div>"#,
            n % 9 + 1
        )
    }

    pub const HEADER_ROW: &str = r#"<div class="el title">
        <span class="t1">职位名</span><span class="t2">公司名</span><span class="t3">工作地点</span>
        <span class="t4">薪资</span><span class="t5">发布时间</span>
    </div>"#;

    /// A page with a header row, the given rows and a pager whose last item
    /// links to `next` (or has no link when `None`).
    pub fn page(rows: &[String], next: Option<&str>) -> String {
        let next_item = match next {
            Some(href) => format!(r#"<li class="bk"><a href="{href}">下一页</a></li>"#),
            None => r#"<li class="bk"><span>下一页</span></li>"#.to_string(),
        };
        format!(
            r#"<html><head><title>51job</title></head><body>
            <div class="dw_table" id="resultList">
                {HEADER_ROW}
                {}
            </div>
            <div class="p_in"><ul>
                <li class="bk"><a href="/jobsearch/search_result.php?curr_page=0">上一页</a></li>
                <li class="on">1</li>
                {next_item}
            </ul></div>
            </body></html>"#,
            rows.join("\n")
        )
    }

    pub fn rows(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(listing).collect()
    }
}
