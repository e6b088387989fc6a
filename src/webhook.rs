//! Discord webhook delivery.
//!
//! [`WebhookPayload`] is the JSON shape the webhook accepts. [`Deliver`] is
//! the seam the tracker posts through; [`DiscordWebhook`] implements it with
//! a blocking HTTP client. Transport failures and rejected payloads are
//! kept apart: the first is fatal, the second is only logged.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;

use crate::message::RenderedMessage;
use crate::{Error, Result};

const TIMEOUT_SECS: u64 = 30;
const FOOTER_TEXT: &str = concat!("SC-Devtracker ", env!("CARGO_PKG_VERSION"));

/// Status Discord answers a successful webhook call with.
pub const ACCEPTED: u16 = 204;
/// Status for a payload Discord could not make sense of.
pub const BAD_REQUEST: u16 = 400;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookPayload {
    /// Plain message text above the embed. Serialized as `null` when unset.
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Embed {
    pub description: String,
    pub color: u32,
    pub footer: Footer,
    pub author: Author,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Footer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Image {
    pub url: String,
}

impl WebhookPayload {
    /// One-embed payload for `message`.
    pub fn new(
        message: &RenderedMessage,
        title: Option<&str>,
        footer_icon_url: Option<&str>,
    ) -> Self {
        let embed = Embed {
            description: message.body_markdown.clone(),
            color: message.color,
            footer: Footer {
                icon_url: footer_icon_url.map(String::from),
                text: FOOTER_TEXT.to_string(),
            },
            author: Author {
                name: message.author_name.clone(),
                icon_url: message.author_icon_url.clone(),
            },
            fields: vec![
                Field {
                    name: "Topic".to_string(),
                    value: format!("[{}]({})", message.topic_title, message.topic_link),
                    inline: Some(true),
                },
                Field {
                    name: "Published".to_string(),
                    value: message.published_display.clone(),
                    inline: Some(true),
                },
            ],
            image: message.image_url.clone().map(|url| Image { url }),
        };

        Self {
            content: title.map(String::from),
            embeds: vec![embed],
        }
    }
}

/// What came back from the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub body: String,
}

/// Seam between the tracker and the delivery endpoint.
pub trait Deliver {
    /// Post `payload`. Only an unreachable endpoint is an `Err`
    /// ([`Error::DeliveryTransport`]); any HTTP answer is `Ok`.
    fn post(&self, payload: &WebhookPayload) -> Result<DeliveryResponse>;
}

/// Map an HTTP answer onto the error taxonomy.
pub fn check_response(response: &DeliveryResponse) -> Result<()> {
    match response.status {
        ACCEPTED => Ok(()),
        BAD_REQUEST => Err(Error::MalformedPayload(response.body.clone())),
        status => Err(Error::DeliveryRejected {
            status,
            body: response.body.clone(),
        }),
    }
}

pub struct DiscordWebhook {
    url: String,
    client: Client,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::DeliveryTransport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl Deliver for DiscordWebhook {
    fn post(&self, payload: &WebhookPayload) -> Result<DeliveryResponse> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .map_err(|e| Error::DeliveryTransport(e.to_string()))?;

        let status = response.status().as_u16();
        // The body only matters for diagnostics; an unreadable one is not a
        // transport failure.
        let body = response.text().unwrap_or_default();

        Ok(DeliveryResponse { status, body })
    }
}
