//! WebSocket channel to the transfer server.
//!
//! Text frames flow inbound as [`ChannelEvent`]s; outbound frames go
//! through a write queue. A ping pump keeps the connection alive and the
//! read pump's pong deadline detects a dead peer.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use waltz_protocol::constants::{WS_MAX_MESSAGE_SIZE, WS_REQUEST_TIMEOUT};
use waltz_transfer::{BoxFuture, ChannelError, ChannelEvent, TransferLink};

/// Capacity of the outbound and inbound queues.
const QUEUE_CAPACITY: usize = 256;

/// Errors from the transport.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connect timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,
}

impl From<ConnectionError> for ChannelError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Closed => ChannelError::Closed,
            ConnectionError::Status { status, body } => ChannelError::Http { status, body },
            ConnectionError::Json(e) => ChannelError::Json(e),
            ConnectionError::Http(e) => ChannelError::Request(e.to_string()),
            e @ (ConnectionError::Ws(_) | ConnectionError::Timeout) => {
                ChannelError::Connect(e.to_string())
            }
        }
    }
}

/// An open WebSocket channel.
///
/// [`WsChannel::close`] cancels the shared token: the write pump sends a
/// Close frame and the read pump stops without reporting a close.
pub struct WsChannel {
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
    _read_handle: JoinHandle<()>,
    _write_handle: JoinHandle<()>,
    _ping_handle: JoinHandle<()>,
}

impl WsChannel {
    /// Connects to `url` and starts the pumps.
    ///
    /// Returns the channel together with the inbound event queue.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::Receiver<ChannelEvent>), ConnectionError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);

        debug!(%url, "connecting");
        let connect = tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false);
        let (ws_stream, _) = tokio::time::timeout(WS_REQUEST_TIMEOUT, connect)
            .await
            .map_err(|_| ConnectionError::Timeout)??;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(QUEUE_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel::<ChannelEvent>(QUEUE_CAPACITY);
        let cancel = CancellationToken::new();

        let write_handle = tokio::spawn(crate::pumps::write::write_pump(
            write,
            write_rx,
            cancel.clone(),
        ));
        let read_handle = tokio::spawn(crate::pumps::read::read_pump(
            read,
            events_tx,
            write_tx.clone(),
            cancel.clone(),
        ));
        let ping_handle = tokio::spawn(crate::pumps::ping::ping_pump(
            write_tx.clone(),
            cancel.clone(),
        ));

        debug!(%url, "connected");
        let channel = Self {
            write_tx,
            cancel,
            _read_handle: read_handle,
            _write_handle: write_handle,
            _ping_handle: ping_handle,
        };
        Ok((channel, events_rx))
    }

    /// Queues a text frame.
    pub async fn send_text(&self, text: String) -> Result<(), ConnectionError> {
        if self.cancel.is_cancelled() {
            return Err(ConnectionError::Closed);
        }
        trace!(frame = %text, "sending");
        self.write_tx
            .send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(|_| ConnectionError::Closed)
    }

    /// Closes the channel. Never waits on the network.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            debug!("closing channel");
            self.cancel.cancel();
        }
    }

    /// Returns `true` once the channel was closed by either side.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl TransferLink for WsChannel {
    fn send(&self, text: String) -> BoxFuture<'_, Result<(), ChannelError>> {
        Box::pin(async move { self.send_text(text).await.map_err(ChannelError::from) })
    }

    fn close(&self) {
        WsChannel::close(self);
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        // The write pump exits on its own after sending the Close frame.
        self.cancel.cancel();
        self._read_handle.abort();
        self._ping_handle.abort();
    }
}
