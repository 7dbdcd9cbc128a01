//! Channel abstraction between the controller and the transport.
//!
//! `waltz-connection` implements these traits on top of a WebSocket.
//! Using traits keeps the session logic decoupled from the transport and
//! testable with mocks.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use waltz_protocol::SelectionItem;

/// Boxed, sendable future used by the object-safe traits below.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Transport-level failures.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("{0}")]
    Connect(String),

    #[error("channel closed")]
    Closed,

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Something arriving on the inbound half of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A text frame.
    Text(String),
    /// The channel closed (close frame, read error, stream end or dead peer).
    Closed,
}

/// Outbound half of an open channel.
pub trait TransferLink: Send + Sync {
    /// Queues a text frame.
    fn send(&self, text: String) -> BoxFuture<'_, Result<(), ChannelError>>;

    /// Closes the channel. Idempotent; never waits on the network.
    fn close(&self);
}

/// An opened channel: the outbound link plus the inbound event queue.
///
/// The receiver is the single-consumer queue that serializes event
/// application.
pub struct OpenChannel {
    pub link: Box<dyn TransferLink>,
    pub events: mpsc::Receiver<ChannelEvent>,
}

/// Opens channels to the transfer server.
pub trait ChannelConnector: Send + Sync {
    /// Opens a channel to `endpoint`.
    fn open<'a>(&'a self, endpoint: &'a str)
    -> BoxFuture<'a, Result<OpenChannel, ChannelError>>;

    /// Announces the selection at `url` ahead of opening the channel.
    fn announce<'a>(
        &'a self,
        url: &'a str,
        items: &'a [SelectionItem],
    ) -> BoxFuture<'a, Result<(), ChannelError>>;
}

/// A session's ownership of its channel.
///
/// While the channel is still connecting the lease only holds the
/// cancellation token the connect is raced against; once open it also
/// holds the link. Dropping the lease cancels the token and closes the
/// link, so a session can never end with its channel open.
pub struct ChannelLease {
    cancel: CancellationToken,
    link: Option<Box<dyn TransferLink>>,
}

impl ChannelLease {
    /// Creates a lease for a channel that is about to be opened.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            link: None,
        }
    }

    /// Token cancelled when the lease is released.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Takes ownership of the opened link.
    pub fn attach(&mut self, link: Box<dyn TransferLink>) {
        if let Some(old) = self.link.replace(link) {
            old.close();
        }
    }

    /// Returns `true` once a link is attached.
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Releases the channel.
    pub fn release(self) {
        drop(self);
    }
}

impl Default for ChannelLease {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChannelLease {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(link) = self.link.take() {
            trace!("closing leased channel");
            link.close();
        }
    }
}

impl fmt::Debug for ChannelLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelLease")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("open", &self.link.is_some())
            .finish()
    }
}
