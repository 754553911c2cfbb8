//! Per-connection delivery handle.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Identifier assigned to a client when its connection is accepted.
pub type ClientId = u64;

/// Send side of a client's outbound queue.
///
/// The connection task owns the socket and drains the queue; everything else
/// (the registry, the broadcast engine) only holds clones of this handle.
/// Once the connection's writer has gone away, [`ClientHandle::deliver`] fails.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: mpsc::UnboundedSender<Arc<str>>,
}

/// Returned when the receiving side of a handle no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientGone;

impl ClientHandle {
    /// Create a handle together with the queue the connection writer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Arc<str>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a message for this client. Never blocks.
    pub fn deliver(&self, text: Arc<str>) -> Result<(), ClientGone> {
        self.tx.send(text).map_err(|_| ClientGone)
    }

    /// Whether both handles feed the same connection.
    pub fn same_client(&self, other: &ClientHandle) -> bool {
        self.tx.same_channel(&other.tx)
    }
}
