//! Error types for the tracker.
//!
//! Two variants are fatal to the process: a broken configuration and an
//! unreachable webhook. Everything else is logged and the daemon carries on
//! with the next entry or the next poll.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unparsable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The feed could not be fetched or parsed. Retried on the next tick.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// An entry links to a host with no [`crate::site::SiteProfile`].
    #[error("no site profile for host `{0}`")]
    UnknownSite(String),

    /// The webhook endpoint could not be reached at all.
    #[error("webhook unreachable: {0}")]
    DeliveryTransport(String),

    /// The webhook answered with something other than 204.
    #[error("webhook rejected payload ({status}): {body}")]
    DeliveryRejected { status: u16, body: String },

    /// The webhook answered 400: the JSON we sent was not accepted.
    #[error("webhook reported a malformed payload: {0}")]
    MalformedPayload(String),
}

impl Error {
    /// Whether the process should stop after logging this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::DeliveryTransport(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
