//! Feed acquisition layer.
//!
//! This module defines the [`FeedSource`] trait and the [`FeedEntry`] type.
//! The only concrete source is [`RssSource`]; the watcher is written against
//! the trait so tests can hand it canned feeds.

mod feed_entry;
mod rss;

pub use feed_entry::{ConditionalToken, FeedEntry, FetchOutcome};
pub use rss::RssSource;

#[cfg(test)]
pub(crate) use feed_entry::tests::make_entry;

use crate::Result;

/// Trait every feed source implements.
///
/// ```ignore
/// pub struct CannedSource(Vec<FeedEntry>);
///
/// impl FeedSource for CannedSource {
///     fn fetch(&self, _token: Option<&ConditionalToken>) -> Result<FetchOutcome> {
///         Ok(FetchOutcome::Modified { token: None, entries: self.0.clone() })
///     }
/// }
/// ```
pub trait FeedSource {
    /// Fetch the feed, passing the validators from the previous successful
    /// fetch so the server may answer "not modified".
    ///
    /// Network failures and unparsable documents are [`crate::Error::Fetch`].
    fn fetch(&self, token: Option<&ConditionalToken>) -> Result<FetchOutcome>;
}
