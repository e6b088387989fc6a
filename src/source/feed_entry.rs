//! The entry type produced by every feed source.
//!
//! A `FeedEntry` lives for a single poll: the watcher picks the new ones,
//! the tracker renders and delivers them, then they are dropped. Nothing is
//! persisted.

use chrono::{DateTime, Utc};

/// A single feed entry, normalised from the source format.
///
/// Sources return entries in feed order, which for the dev-tracker feeds is
/// newest first. The watcher relies on that order rather than on
/// `published`, because forum feeds occasionally carry identical or missing
/// timestamps.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FeedEntry {
    /// Stable identifier used to find the last delivered entry.
    ///
    /// For RSS this is the `<guid>` element (falling back to `<link>`).
    pub id: String,

    /// Thread or topic title.
    pub title: String,

    /// Display name of the poster.
    pub author: String,

    /// URL of the post. Its host selects the site profile.
    pub link: String,

    /// Publication timestamp, `None` when the feed omitted it or it did not
    /// parse.
    pub published: Option<DateTime<Utc>>,

    /// Raw HTML body of the post.
    pub summary_html: String,
}

impl FeedEntry {
    /// Host component of [`link`](Self::link), if it parses as a URL.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.link)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// Opaque cache validators returned by the feed server.
///
/// Sent back on the next request so the server can answer
/// `304 Not Modified` instead of the whole document.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ConditionalToken {
    pub last_modified: Option<String>,
    pub etag: Option<String>,
}

impl ConditionalToken {
    /// `None` when the server sent neither validator.
    pub fn new(last_modified: Option<String>, etag: Option<String>) -> Option<Self> {
        if last_modified.is_none() && etag.is_none() {
            return None;
        }
        Some(Self {
            last_modified,
            etag,
        })
    }
}

/// Result of one conditional fetch.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FetchOutcome {
    /// The server confirmed nothing changed since the token was issued.
    NotModified,
    /// A full document, entries newest first.
    Modified {
        token: Option<ConditionalToken>,
        entries: Vec<FeedEntry>,
    },
}
