//! Broadcast engine fanning messages out to every registered client.
//!
//! Each client has its own unbounded queue, so one broadcast is a snapshot of
//! the registry followed by a non-blocking push per client. The engine is
//! plain synchronous code and can be driven from async tasks and from the
//! blocking FIFO reader thread alike.

use super::client::ClientId;
use super::events::{BroadcastMessage, MessageSource};
use super::registry::ClientRegistry;

/// The single broadcast domain, shared through `AppState`.
pub struct BroadcastEngine {
    registry: ClientRegistry,
}

impl BroadcastEngine {
    pub fn new() -> Self {
        Self {
            registry: ClientRegistry::new(),
        }
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Deliver `message` to every client registered at the time of the call.
    ///
    /// A client whose connection is already gone is unregistered; the other
    /// deliveries are unaffected and nothing is reported to the caller.
    pub fn broadcast(&self, message: BroadcastMessage) {
        let recipients = self.registry.snapshot();
        let mut dropped = 0usize;

        for (id, handle) in &recipients {
            if handle.deliver(message.text.clone()).is_err() {
                tracing::debug!(client_id = id, source = %message.source, "client gone during broadcast");
                if self.registry.unregister_handle(*id, handle) {
                    dropped += 1;
                }
            }
        }

        tracing::debug!(
            source = %message.source,
            recipients = recipients.len(),
            dropped,
            "broadcast delivered"
        );
    }

    /// Tell every client that someone joined.
    pub fn announce_join(&self) {
        self.broadcast(BroadcastMessage::join_announcement());
    }

    /// Forward a line read from the external channel.
    pub fn relay_line(&self, line: &str) {
        self.broadcast(BroadcastMessage::new(MessageSource::Channel, line));
    }

    /// Forward a message a client sent.
    pub fn relay_client(&self, id: ClientId, text: &str) {
        self.broadcast(BroadcastMessage::new(MessageSource::Client(id), text));
    }
}

impl Default for BroadcastEngine {
    fn default() -> Self {
        Self::new()
    }
}
