//! Broadcast message types and log formatting helpers.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::client::ClientId;

/// Announcement sent to every client (the newcomer included) on each join.
pub const JOIN_ANNOUNCEMENT: &str = "a new participant has joined";

/// Longest client message prefix written to the log.
pub const LOG_PREVIEW_CHARS: usize = 200;

/// Appended to a log preview that was cut short.
pub const TRUNCATION_MARKER: &str = "..";

/// Where a broadcast came from. Only used for diagnostics; every message goes
/// to every client regardless of origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    System,
    Client(ClientId),
    Channel,
}

impl fmt::Display for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSource::System => f.write_str("system"),
            MessageSource::Client(id) => write!(f, "client({id})"),
            MessageSource::Channel => f.write_str("fifo"),
        }
    }
}

/// An immutable text payload shared by all recipients of one broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastMessage {
    pub source: MessageSource,
    pub text: Arc<str>,
}

impl BroadcastMessage {
    pub fn new(source: MessageSource, text: impl Into<Arc<str>>) -> Self {
        Self {
            source,
            text: text.into(),
        }
    }

    pub fn join_announcement() -> Self {
        Self::new(MessageSource::System, JOIN_ANNOUNCEMENT)
    }
}

/// Shorten a client message for logging.
///
/// Messages longer than [`LOG_PREVIEW_CHARS`] characters are cut to that many
/// characters and suffixed with [`TRUNCATION_MARKER`].
pub fn truncate_for_log(message: &str) -> Cow<'_, str> {
    match message.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &message[..cut], TRUNCATION_MARKER)),
        None => Cow::Borrowed(message),
    }
}
