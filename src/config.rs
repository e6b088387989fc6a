//! Configuration file.
//!
//! ```toml
//! [general]
//! fetch_delay = 60
//! locale = "fr_FR"
//! timezone = "Europe/Paris"
//!
//! [rss]
//! feed_url = "https://example.com/feed.rss"
//!
//! [discord]
//! webhook_url = "https://discord.com/api/webhooks/..."
//! embed_title = "New dev post"
//! show_timezone = true
//! ```
//!
//! Only the two URLs are required. Empty strings count as unset.

use std::path::Path;
use std::time::Duration;

use chrono::Locale;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::message::{DisplayZone, Presentation};
use crate::tracker::Appearance;
use crate::{Error, Result};

/// Used when `fetch_delay` is absent, zero or invalid.
pub const DEFAULT_FETCH_DELAY_SECS: u64 = 60;

/// Largest colour an embed accepts.
const MAX_EMBED_COLOR: u32 = 0xFF_FF_FF;

pub const FEED_URL_ENV: &str = "DEVTRACKER_FEED_URL";
pub const WEBHOOK_URL_ENV: &str = "DEVTRACKER_WEBHOOK_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub rss: RssConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Seconds between polls. Kept loose so a bad value only costs a
    /// warning; see [`Config::poll_interval`].
    pub fetch_delay: Option<toml::Value>,
    /// `LC_TIME`-style name such as `fr_FR`; a `.UTF-8` suffix is accepted.
    pub locale: Option<String>,
    /// IANA name. Host local time when unset.
    pub timezone: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            fetch_delay: None,
            locale: None,
            timezone: None,
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RssConfig {
    #[serde(default)]
    pub feed_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub webhook_url: String,
    pub embed_title: Option<String>,
    /// Decimal RGB, replaces the per-site colour. Invalid values are
    /// ignored with a warning.
    pub embed_color: Option<toml::Value>,
    pub embed_footer_icon_url: Option<String>,
    #[serde(default)]
    pub show_timezone: bool,
}

impl Config {
    /// Read, apply environment overrides, and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Supported environment variables:
    /// - `DEVTRACKER_FEED_URL`: replaces `rss.feed_url`
    /// - `DEVTRACKER_WEBHOOK_URL`: replaces `discord.webhook_url`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(FEED_URL_ENV).filter(|v| !v.is_empty()) {
            self.rss.feed_url = url;
        }
        if let Some(url) = lookup(WEBHOOK_URL_ENV).filter(|v| !v.is_empty()) {
            self.discord.webhook_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_url("rss.feed_url", &self.rss.feed_url)?;
        check_url("discord.webhook_url", &self.discord.webhook_url)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        let Some(value) = &self.general.fetch_delay else {
            return Duration::from_secs(DEFAULT_FETCH_DELAY_SECS);
        };
        let secs = match as_integer(value).map(u64::try_from) {
            Some(Ok(0)) => DEFAULT_FETCH_DELAY_SECS,
            Some(Ok(secs)) => secs,
            _ => {
                warn!(
                    "Invalid fetch_delay {value}, falling back to {DEFAULT_FETCH_DELAY_SECS}s"
                );
                DEFAULT_FETCH_DELAY_SECS
            }
        };
        Duration::from_secs(secs)
    }

    /// The configured embed colour, if it is a decimal RGB value.
    pub fn color_override(&self) -> Option<u32> {
        let value = self.discord.embed_color.as_ref()?;
        let color = as_integer(value)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|&n| n <= MAX_EMBED_COLOR);
        if color.is_none() {
            warn!("embed_color {value} is not a decimal colour, ignoring it");
        }
        color
    }

    /// Display settings. Unknown timezone or locale names fall back to the
    /// host zone and the POSIX locale with a warning.
    pub fn presentation(&self) -> Presentation {
        Presentation {
            color_override: self.color_override(),
            zone: non_empty(&self.general.timezone)
                .map_or(DisplayZone::Local, parse_zone),
            show_timezone: self.discord.show_timezone,
            locale: non_empty(&self.general.locale)
                .map_or(Locale::POSIX, parse_locale),
        }
    }

    pub fn appearance(&self) -> Appearance {
        Appearance {
            presentation: self.presentation(),
            title: non_empty(&self.discord.embed_title).map(String::from),
            footer_icon_url: non_empty(&self.discord.embed_footer_icon_url).map(String::from),
        }
    }
}

/// Integers, or strings holding one.
fn as_integer(value: &toml::Value) -> Option<i64> {
    match value {
        toml::Value::Integer(n) => Some(*n),
        toml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn check_url(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{key} is not set")));
    }
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::Config(format!("{key} is not a valid URL: {e}")))
}

fn parse_zone(name: &str) -> DisplayZone {
    match name.parse::<Tz>() {
        Ok(tz) => DisplayZone::Named(tz),
        Err(_) => {
            warn!("Unknown timezone `{name}`, falling back to host time");
            DisplayZone::Local
        }
    }
}

fn parse_locale(name: &str) -> Locale {
    let base = name
        .split_once('.')
        .map_or(name, |(base, _encoding)| base);
    match Locale::try_from(base) {
        Ok(locale) => locale,
        Err(_) => {
            warn!("Unknown locale `{name}`, falling back to POSIX");
            Locale::POSIX
        }
    }
}
