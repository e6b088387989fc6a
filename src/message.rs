//! Message assembly.
//!
//! Combines a feed entry, its rendered body and its site profile into the
//! values the webhook embed is built from.

use chrono::{DateTime, Local, Locale, Utc};
use chrono_tz::Tz;

use crate::render::budget::DESCRIPTION_LIMIT;
use crate::render::{render_body, RenderedBody};
use crate::site::Site;
use crate::source::FeedEntry;
use crate::{Error, Result};

const PUBLISHED_FORMAT: &str = "%e %b %Y %H:%M";
const PUBLISHED_FORMAT_WITH_OFFSET: &str = "%e %b %Y %H:%M (UTC%z)";

/// Timezone publication dates are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Named(Tz),
    /// Whatever the host is set to.
    Local,
}

/// Operator choices that affect how every message looks.
#[derive(Debug, Clone)]
pub struct Presentation {
    /// Replaces the site colour when set.
    pub color_override: Option<u32>,
    pub zone: DisplayZone,
    /// Append the UTC offset to the published timestamp.
    pub show_timezone: bool,
    /// Language for month names.
    pub locale: Locale,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            color_override: None,
            zone: DisplayZone::Local,
            show_timezone: false,
            locale: Locale::POSIX,
        }
    }
}

impl Presentation {
    pub fn format_published(&self, published: &DateTime<Utc>) -> String {
        let format = if self.show_timezone {
            PUBLISHED_FORMAT_WITH_OFFSET
        } else {
            PUBLISHED_FORMAT
        };
        let text = match self.zone {
            DisplayZone::Named(tz) => published
                .with_timezone(&tz)
                .format_localized(format, self.locale)
                .to_string(),
            DisplayZone::Local => published
                .with_timezone(&Local)
                .format_localized(format, self.locale)
                .to_string(),
        };
        text.trim_start().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// At most [`DESCRIPTION_LIMIT`] characters.
    pub body_markdown: String,
    pub color: u32,
    pub author_name: String,
    pub author_icon_url: String,
    pub image_url: Option<String>,
    pub topic_title: String,
    pub topic_link: String,
    pub published_display: String,
}

/// Build the message for `entry` from an already rendered body.
pub fn assemble(
    entry: &FeedEntry,
    body: RenderedBody,
    presentation: &Presentation,
) -> Result<RenderedMessage> {
    let site = site_of(entry)?;
    let profile = site.profile();

    Ok(RenderedMessage {
        body_markdown: body.markdown,
        color: presentation.color_override.unwrap_or(profile.color),
        author_name: entry.author.clone(),
        author_icon_url: profile.icon_url.to_string(),
        image_url: body.image_url,
        topic_title: entry.title.clone(),
        topic_link: entry.link.clone(),
        published_display: entry
            .published
            .map(|dt| presentation.format_published(&dt))
            .unwrap_or_else(|| "-".to_string()),
    })
}

/// Render the body of `entry` and assemble its message.
///
/// The site is checked first so entries from unknown hosts are rejected
/// before any HTML work.
pub fn compose(entry: &FeedEntry, presentation: &Presentation) -> Result<RenderedMessage> {
    site_of(entry)?;
    let body = render_body(&entry.summary_html, DESCRIPTION_LIMIT);
    assemble(entry, body, presentation)
}

fn site_of(entry: &FeedEntry) -> Result<Site> {
    let host = entry
        .host()
        .ok_or_else(|| Error::UnknownSite(entry.link.clone()))?;
    Site::from_host(&host)
}
