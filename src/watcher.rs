//! New-entry detection.
//!
//! The feed is a rolling window of the most recent posts, newest first. The
//! watcher remembers a single identifier, the newest entry it has already
//! handed out, and on each poll returns whatever sits above it, oldest first.
//!
//! Policies:
//!
//! * **Startup.** With no remembered identifier only the newest entry is
//!   returned, so a restart never floods the channel with the backlog.
//! * **Gap.** If the remembered identifier is no longer inside the scanned
//!   window (the feed moved faster than the poll interval, or the post was
//!   deleted) the whole window is returned. Anything older than the window is
//!   lost, and if the remembered post was deleted rather than pushed out,
//!   entries below it are delivered a second time.

use tracing::{debug, info, warn};

use crate::source::{ConditionalToken, FeedEntry, FeedSource, FetchOutcome};
use crate::Result;

/// How many entries from the top of the feed are searched for the last seen
/// identifier.
pub const SCAN_WINDOW: usize = 10;

/// Mutable state carried between polls. Lives only as long as the process.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct WatcherState {
    /// Validators from the last successful fetch.
    pub token: Option<ConditionalToken>,
    /// Identifier of the freshest entry already returned. Never cleared once
    /// set.
    pub last_seen_id: Option<String>,
}

pub struct FeedWatcher<S> {
    source: S,
    state: WatcherState,
    window: usize,
}

impl<S: FeedSource> FeedWatcher<S> {
    pub fn new(source: S) -> Self {
        Self::with_state(source, WatcherState::default())
    }

    /// Start from a known state instead of a cold start.
    pub fn with_state(source: S, state: WatcherState) -> Self {
        Self {
            source,
            state,
            window: SCAN_WINDOW,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    /// Fetch the feed and return the entries not yet seen, oldest first.
    ///
    /// A "not modified" answer returns nothing and leaves the state alone.
    /// Fetch failures are returned unchanged and also leave the state alone.
    pub fn poll(&mut self) -> Result<Vec<FeedEntry>> {
        debug!("Fetching RSS feed...");
        let (token, entries) = match self.source.fetch(self.state.token.as_ref())? {
            FetchOutcome::NotModified => {
                debug!("RSS feed wasn't modified since last check");
                return Ok(Vec::new());
            }
            FetchOutcome::Modified { token, entries } => (token, entries),
        };

        self.state.token = token;
        Ok(self.take_new(entries))
    }

    fn take_new(&mut self, mut entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
        let Some(newest) = entries.first() else {
            warn!("RSS feed returned no entries");
            return Vec::new();
        };
        let newest_id = newest.id.clone();

        let Some(last_seen) = self.state.last_seen_id.as_deref() else {
            info!("Initial last entry set to: {}", newest.title);
            self.state.last_seen_id = Some(newest_id);
            entries.truncate(1);
            return entries;
        };

        if last_seen == newest_id {
            debug!("Feed was modified but its newest entry is unchanged");
            return Vec::new();
        }

        entries.truncate(self.window);
        match entries.iter().position(|e| e.id == last_seen) {
            Some(k) => entries.truncate(k),
            None => warn!(
                "Last seen entry {last_seen} fell out of the last {} entries; sending them all",
                entries.len()
            ),
        }

        entries.reverse();
        self.state.last_seen_id = Some(newest_id);
        entries
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::source::make_entry;
    use crate::Error;

    /// Replays a scripted sequence of fetch results and records the tokens
    /// it was called with.
    struct ScriptedSource {
        replies: RefCell<VecDeque<Result<FetchOutcome>>>,
        seen_tokens: RefCell<Vec<Option<ConditionalToken>>>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Result<FetchOutcome>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                seen_tokens: RefCell::new(Vec::new()),
            }
        }
    }

    impl FeedSource for ScriptedSource {
        fn fetch(&self, token: Option<&ConditionalToken>) -> Result<FetchOutcome> {
            self.seen_tokens.borrow_mut().push(token.cloned());
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("no scripted reply left")
        }
    }

    /// Entries `E<hi>` down to `E<lo>`, newest first.
    fn feed(hi: u32, lo: u32) -> Vec<FeedEntry> {
        (lo..=hi).rev().map(|n| make_entry(&format!("E{n}"))).collect()
    }

    fn modified(entries: Vec<FeedEntry>) -> Result<FetchOutcome> {
        Ok(FetchOutcome::Modified {
            token: None,
            entries,
        })
    }

    fn ids(entries: &[FeedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn seen(id: &str) -> WatcherState {
        WatcherState {
            token: None,
            last_seen_id: Some(id.to_string()),
        }
    }

    #[test]
    fn cold_start_emits_only_the_newest_entry() {
        let mut watcher = FeedWatcher::new(ScriptedSource::new(vec![modified(feed(5, 1))]));

        let new = watcher.poll().unwrap();

        assert_eq!(ids(&new), vec!["E5"]);
        assert_eq!(watcher.state().last_seen_id.as_deref(), Some("E5"));
    }

    #[test]
    fn emits_entries_above_last_seen_oldest_first() {
        let source = ScriptedSource::new(vec![modified(feed(7, 3))]);
        let mut watcher = FeedWatcher::with_state(source, seen("E5"));

        let new = watcher.poll().unwrap();

        assert_eq!(ids(&new), vec!["E6", "E7"]);
        assert_eq!(watcher.state().last_seen_id.as_deref(), Some("E7"));
    }

    #[test]
    fn gap_emits_whole_window_oldest_first() {
        let source = ScriptedSource::new(vec![modified(feed(10, 6))]);
        let mut watcher = FeedWatcher::with_state(source, seen("E1"));

        let new = watcher.poll().unwrap();

        assert_eq!(ids(&new), vec!["E6", "E7", "E8", "E9", "E10"]);
        assert_eq!(watcher.state().last_seen_id.as_deref(), Some("E10"));
    }

    #[test]
    fn gap_is_bounded_by_the_scan_window() {
        let source = ScriptedSource::new(vec![modified(feed(30, 1))]);
        let mut watcher = FeedWatcher::with_state(source, seen("E100"));

        let new = watcher.poll().unwrap();

        assert_eq!(new.len(), SCAN_WINDOW);
        assert_eq!(new.first().unwrap().id, "E21");
        assert_eq!(new.last().unwrap().id, "E30");
    }

    #[test]
    fn last_seen_below_the_window_counts_as_a_gap() {
        let source = ScriptedSource::new(vec![modified(feed(20, 1))]);
        let mut watcher = FeedWatcher::with_state(source, seen("E5"));

        let new = watcher.poll().unwrap();

        assert_eq!(ids(&new).first(), Some(&"E11"));
        assert_eq!(new.len(), SCAN_WINDOW);
    }

    #[test]
    fn deleted_last_seen_resends_entries_already_delivered() {
        // E5 was delivered and then removed from the feed. E4 and E3 were
        // delivered before it, but the watcher cannot tell.
        let mut entries = feed(7, 3);
        entries.retain(|e| e.id != "E5");
        let source = ScriptedSource::new(vec![modified(entries)]);
        let mut watcher = FeedWatcher::with_state(source, seen("E5"));

        let new = watcher.poll().unwrap();

        assert_eq!(ids(&new), vec!["E3", "E4", "E6", "E7"]);
    }

    #[test]
    fn unchanged_newest_entry_emits_nothing() {
        let source = ScriptedSource::new(vec![modified(feed(5, 1))]);
        let mut watcher = FeedWatcher::with_state(source, seen("E5"));

        assert!(watcher.poll().unwrap().is_empty());
        assert_eq!(watcher.state().last_seen_id.as_deref(), Some("E5"));
    }

    #[test]
    fn consecutive_polls_advance_the_frontier() {
        let source = ScriptedSource::new(vec![
            modified(feed(5, 1)),
            modified(feed(6, 2)),
            modified(feed(8, 4)),
        ]);
        let mut watcher = FeedWatcher::new(source);

        assert_eq!(ids(&watcher.poll().unwrap()), vec!["E5"]);
        assert_eq!(ids(&watcher.poll().unwrap()), vec!["E6"]);
        assert_eq!(ids(&watcher.poll().unwrap()), vec!["E7", "E8"]);
        assert_eq!(watcher.state().last_seen_id.as_deref(), Some("E8"));
    }

    #[test]
    fn not_modified_leaves_state_untouched() {
        let token = ConditionalToken::new(Some("yesterday".into()), None);
        let state = WatcherState {
            token: token.clone(),
            last_seen_id: Some("E5".into()),
        };
        let source = ScriptedSource::new(vec![Ok(FetchOutcome::NotModified)]);
        let mut watcher = FeedWatcher::with_state(source, state.clone());

        assert!(watcher.poll().unwrap().is_empty());
        assert_eq!(watcher.state(), &state);
        assert_eq!(watcher.source.seen_tokens.borrow()[0], token);
    }

    #[test]
    fn token_from_successful_fetch_is_sent_next_time() {
        let token = ConditionalToken::new(None, Some("\"v2\"".into()));
        let source = ScriptedSource::new(vec![
            Ok(FetchOutcome::Modified {
                token: token.clone(),
                entries: feed(3, 1),
            }),
            Ok(FetchOutcome::NotModified),
        ]);
        let mut watcher = FeedWatcher::new(source);

        watcher.poll().unwrap();
        watcher.poll().unwrap();

        let seen_tokens = watcher.source.seen_tokens.borrow();
        assert_eq!(seen_tokens[0], None);
        assert_eq!(seen_tokens[1], token);
    }

    #[test]
    fn fetch_error_is_returned_and_state_kept() {
        let source = ScriptedSource::new(vec![Err(Error::Fetch("timeout".into()))]);
        let mut watcher = FeedWatcher::with_state(source, seen("E5"));

        assert!(matches!(watcher.poll(), Err(Error::Fetch(_))));
        assert_eq!(watcher.state(), &seen("E5"));
    }

    #[test]
    fn empty_feed_emits_nothing_and_keeps_state() {
        let source = ScriptedSource::new(vec![modified(Vec::new())]);
        let mut watcher = FeedWatcher::with_state(source, seen("E5"));

        assert!(watcher.poll().unwrap().is_empty());
        assert_eq!(watcher.state().last_seen_id.as_deref(), Some("E5"));
    }
}
