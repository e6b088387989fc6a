//! sc-devtracker — relays new developer posts from an RSS feed to a Discord
//! webhook.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ entries ┌──────────┐ new entries ┌────────────┐ payload ┌────────────┐
//! │ source/  │ ──────► │ watcher  │ ──────────► │  message   │ ──────► │  webhook   │
//! │ (RSS)    │         │ (state)  │             │ + render/  │         │ (Discord)  │
//! └──────────┘         └──────────┘             └────────────┘         └────────────┘
//!                            ▲                                               │
//!                            └────────────── tracker (loop) ─────────────────┘
//! ```
//!
//! * **`source/`** — the `FeedSource` trait and the RSS implementation.
//! * **`watcher`** — remembers the last delivered entry and picks out new ones.
//! * **`render/`** — summary HTML to length-limited Markdown.
//! * **`site`** / **`message`** — per-site icon and colour, embed fields.
//! * **`webhook`** — payload serialization and delivery.
//! * **`tracker`** — the fetch, render and deliver cycle on a timer.
//! * **`main`** — reads the config, sets up logging, and runs the tracker
//!   until it hits a fatal error.

mod config;
mod error;
mod logging;
mod message;
mod render;
mod site;
mod source;
mod tracker;
mod watcher;
mod webhook;

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};

use config::Config;
use error::{Error, Result};
use source::RssSource;
use tracker::{ThreadSleep, Tracker};
use watcher::FeedWatcher;
use webhook::DiscordWebhook;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Time given to the logs before the process exits on a fatal error.
const CLOSING_DELAY: Duration = Duration::from_secs(5);

fn run(config: &Config) -> anyhow::Result<()> {
    let source = RssSource::new(&config.rss.feed_url).context("cannot set up the feed client")?;
    let webhook =
        DiscordWebhook::new(&config.discord.webhook_url).context("cannot set up the webhook client")?;

    info!("Watching {}", config.rss.feed_url);
    let mut tracker = Tracker::new(
        FeedWatcher::new(source),
        webhook,
        ThreadSleep,
        config.appearance(),
    );

    Err(tracker.run(config.poll_interval()).into())
}

fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = Config::load(&path);
    let level = config
        .as_ref()
        .map_or("info", |c| c.general.log_level.as_str())
        .to_string();
    if let Err(e) = logging::init(&level) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }
    info!("sc-devtracker {}", env!("CARGO_PKG_VERSION"));

    let result = config
        .with_context(|| format!("cannot load {path}"))
        .and_then(|config| run(&config));

    if let Err(e) = result {
        error!("{e:#}");
    }
    error!("Closing in 5s...");
    thread::sleep(CLOSING_DELAY);
    ExitCode::FAILURE
}
