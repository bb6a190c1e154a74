//! Job board scrapers and the HTTP seam they fetch through.
//!
//! A scraper never talks to `reqwest` directly. It is generic over a
//! [`PageFetcher`], which turns a URL into a decoded HTML body:
//!
//! - [`HttpFetcher`]: the production fetcher (timeout, browser-like headers,
//!   forced response encoding)
//! - `testing::FixtureFetcher`: serves canned pages in tests
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | 51job (前程无忧) | [`job51`] | HTML scraping | GBK-encoded result pages, `li.bk` pager |

pub mod job51;

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use encoding_rs::Encoding;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HOST, HeaderMap, HeaderValue};
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Fetches one page and returns its body as text.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP, one request per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    encoding: &'static Encoding,
}

impl HttpFetcher {
    /// Build a client from the timeout, user agent, host header and encoding
    /// in `config`.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let encoding = Encoding::for_label(config.response_encoding.as_bytes()).ok_or_else(|| {
            ScrapeError::InvalidInput(format!(
                "unknown response encoding '{}'",
                config.response_encoding
            ))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        if let Some(host) = &config.host_header {
            let value = HeaderValue::from_str(host).map_err(|_| {
                ScrapeError::InvalidInput(format!("invalid host header '{host}'"))
            })?;
            headers.insert(HOST, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client, encoding })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let (body, _, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            warn!(encoding = self.encoding.name(), "Response contained malformed sequences");
        }
        debug!(
            bytes = bytes.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body.into_owned())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::PageFetcher;
    use crate::error::{Result, ScrapeError};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Serves queued responses in order and records the URLs asked for.
    ///
    /// `Err` entries simulate a failed request. Once the queue is empty,
    /// `repeat` (if set) is served forever, otherwise requests fail.
    #[derive(Default)]
    pub struct FixtureFetcher {
        responses: Mutex<VecDeque<std::result::Result<String, String>>>,
        repeat: Option<String>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FixtureFetcher {
        pub fn new(responses: Vec<std::result::Result<String, String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        pub fn repeating(page: String) -> Self {
            Self {
                repeat: Some(page),
                ..Default::default()
            }
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl PageFetcher for FixtureFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            let next = self.responses.lock().unwrap().pop_front();
            match (next, &self.repeat) {
                (Some(Ok(body)), _) => Ok(body),
                (Some(Err(reason)), _) => Err(ScrapeError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    reason,
                ))),
                (None, Some(body)) => Ok(body.clone()),
                (None, None) => Err(ScrapeError::Status {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_fetcher_rejects_unknown_encoding() {
        let config = ScraperConfig {
            response_encoding: "klingon".to_string(),
            ..Default::default()
        };
        let err = HttpFetcher::new(&config).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput(_)));
    }

    #[test]
    fn test_http_fetcher_rejects_bad_host_header() {
        let config = ScraperConfig {
            host_header: Some("search.51job.com\r\nX-Injected: 1".to_string()),
            ..Default::default()
        };
        let err = HttpFetcher::new(&config).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput(msg) if msg.contains("host")));
    }

    #[test]
    fn test_http_fetcher_builds_with_defaults() {
        let fetcher = HttpFetcher::new(&ScraperConfig::default()).unwrap();
        assert_eq!(fetcher.encoding, encoding_rs::GBK);
    }

    #[test]
    fn test_gbk_decoding() {
        let (bytes, _, _) = encoding_rs::GBK.encode("深圳招聘");
        let (text, _, had_errors) = encoding_rs::GBK.decode(&bytes);
        assert_eq!(text, "深圳招聘");
        assert!(!had_errors);
    }
}
