//! RSS feed source.
//!
//! Fetches an RSS 2.0 document over HTTP with a blocking [`reqwest`] client
//! and maps its items onto [`FeedEntry`] values with the [`rss`] crate.
//! Requests are conditional: the validators from the previous response are
//! sent back so an unchanged feed costs a `304` and no parsing.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use tracing::debug;

use super::{ConditionalToken, FeedEntry, FeedSource, FetchOutcome};
use crate::{Error, Result};

const TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("sc-devtracker/", env!("CARGO_PKG_VERSION"));

/// An RSS feed polled over HTTP.
pub struct RssSource {
    /// The feed URL to poll.
    pub url: String,
    client: Client,
}

impl RssSource {
    /// Create a source for `url` with the default HTTP client settings.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Fetch(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Parse an already-fetched [`rss::Channel`] into [`FeedEntry`]s.
    ///
    /// Pure so the mapping can be tested without the network.
    pub fn parse_channel(channel: &rss::Channel) -> Vec<FeedEntry> {
        channel
            .items()
            .iter()
            .map(|item| {
                // Prefer <guid>, fall back to <link>, then empty string.
                let id = item
                    .guid()
                    .map(|g| g.value().to_string())
                    .or_else(|| item.link().map(String::from))
                    .unwrap_or_default();

                let author = item
                    .author()
                    .map(String::from)
                    .or_else(|| {
                        item.dublin_core_ext()
                            .and_then(|dc| dc.creators().first().cloned())
                    })
                    .unwrap_or_else(|| "Unknown".to_string());

                let summary_html = item
                    .description()
                    .or_else(|| item.content())
                    .unwrap_or_default()
                    .to_string();

                FeedEntry {
                    id,
                    title: item.title().unwrap_or("(untitled)").to_string(),
                    author,
                    link: item.link().unwrap_or_default().to_string(),
                    published: item.pub_date().and_then(parse_date),
                    summary_html,
                }
            })
            .collect()
    }
}

impl FeedSource for RssSource {
    fn fetch(&self, token: Option<&ConditionalToken>) -> Result<FetchOutcome> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = token {
            if let Some(last_modified) = &token.last_modified {
                request = request.header(IF_MODIFIED_SINCE, last_modified);
            }
            if let Some(etag) = &token.etag {
                request = request.header(IF_NONE_MATCH, etag);
            }
        }

        let response = request
            .send()
            .map_err(|e| Error::Fetch(format!("failed to fetch feed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP error: {status}")));
        }

        let token = token_from_headers(response.headers());
        let body = response
            .bytes()
            .map_err(|e| Error::Fetch(format!("failed to read response: {e}")))?;
        let channel = rss::Channel::read_from(body.as_ref())
            .map_err(|e| Error::Fetch(format!("malformed feed: {e}")))?;

        let entries = Self::parse_channel(&channel);
        debug!("Parsed {} feed entries", entries.len());

        Ok(FetchOutcome::Modified { token, entries })
    }
}

fn token_from_headers(headers: &HeaderMap) -> Option<ConditionalToken> {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    ConditionalToken::new(header(LAST_MODIFIED), header(ETAG))
}

/// RFC 2822 is what RSS mandates; some forum software emits RFC 3339.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
