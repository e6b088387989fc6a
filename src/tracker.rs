//! The fetch, render and deliver cycle.
//!
//! [`Tracker::run_once`] performs one cycle; [`Tracker::run`] repeats it with
//! a fixed delay between cycles until something fatal happens. Every wait
//! goes through [`Pause`] so the loop can be driven in tests without a
//! wall clock.

use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::message::{compose, Presentation};
use crate::source::FeedSource;
use crate::watcher::FeedWatcher;
use crate::webhook::{check_response, Deliver, WebhookPayload};
use crate::{Error, Result};

/// Wait after every delivery, so bursts of new posts stay under the webhook
/// rate limit.
pub const DELIVERY_PAUSE: Duration = Duration::from_secs(2);

/// Blocking wait between steps of the loop.
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

/// Sleeps the current thread.
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Per-message settings that do not come from the feed.
#[derive(Debug, Clone, Default)]
pub struct Appearance {
    pub presentation: Presentation,
    /// Message text shown above each embed.
    pub title: Option<String>,
    pub footer_icon_url: Option<String>,
}

pub struct Tracker<S, D, P> {
    watcher: FeedWatcher<S>,
    delivery: D,
    pause: P,
    appearance: Appearance,
}

impl<S: FeedSource, D: Deliver, P: Pause> Tracker<S, D, P> {
    pub fn new(watcher: FeedWatcher<S>, delivery: D, pause: P, appearance: Appearance) -> Self {
        Self {
            watcher,
            delivery,
            pause,
            appearance,
        }
    }

    /// One cycle. Returns how many entries were posted to the webhook.
    ///
    /// Fetch failures skip the cycle, entries from unknown sites are
    /// skipped, and rejected deliveries are logged. Only an unreachable
    /// webhook is returned as an error.
    pub fn run_once(&mut self) -> Result<usize> {
        let entries = match self.watcher.poll() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping cycle: {e}");
                return Ok(0);
            }
        };
        if entries.is_empty() {
            debug!("No new entries");
            return Ok(0);
        }
        info!("Fetched {} new entries", entries.len());

        let mut posted = 0;
        for entry in &entries {
            info!(
                "Sending: \"{}\" [{}]",
                entry.title,
                entry.host().unwrap_or_default()
            );

            let message = match compose(entry, &self.appearance.presentation) {
                Ok(message) => message,
                Err(e) => {
                    error!("Skipping entry {}: {e}", entry.id);
                    continue;
                }
            };
            let payload = WebhookPayload::new(
                &message,
                self.appearance.title.as_deref(),
                self.appearance.footer_icon_url.as_deref(),
            );

            let response = self.delivery.post(&payload)?;
            posted += 1;
            match check_response(&response) {
                Ok(()) => info!("Webhook response: {}", response.status),
                Err(e @ Error::MalformedPayload(_)) => error!("{e}"),
                Err(e) => warn!("{e}"),
            }

            self.pause.pause(DELIVERY_PAUSE);
        }

        Ok(posted)
    }

    /// Run cycles `interval` apart until one fails fatally, and return that
    /// error.
    pub fn run(&mut self, interval: Duration) -> Error {
        info!("Watching feed every {}s", interval.as_secs());
        loop {
            match self.run_once() {
                Ok(_) => {}
                Err(e) if e.is_fatal() => return e,
                Err(e) => error!("{e}"),
            }
            self.pause.pause(interval);
        }
    }
}
