//! Playlist transfer session controller.
//!
//! Owns a single transfer session at a time: opens the channel, sends the
//! start command, applies server events strictly in arrival order and
//! drives the session to exactly one terminal outcome. The crate has no
//! transport dependency; `waltz-connection` provides the WebSocket
//! implementation of [`ChannelConnector`].
//!
//! # Lifecycle
//!
//! 1. **Start**: [`TransferController::start`] creates a session in
//!    `Connecting` and returns a [`SessionHandle`] immediately.
//! 2. **Announce** (optional): the selection is posted ahead of the channel.
//! 3. **Open**: the channel connects and the start command is sent.
//! 4. **Run**: each inbound event is applied by [`TransferSession::apply`].
//! 5. **End**: `done`, `error`, a protocol violation, an unexpected close or
//!    a cancel moves the session to `Finished` or `Failed` and releases the
//!    channel.

pub mod channel;
pub mod controller;
pub mod projection;
pub mod session;
pub mod sink;
pub mod types;

pub use channel::{
    BoxFuture, ChannelConnector, ChannelError, ChannelEvent, ChannelLease, OpenChannel,
    TransferLink,
};
pub use controller::{SessionHandle, TransferController};
pub use projection::{ProgressView, project};
pub use session::TransferSession;
pub use sink::{ProgressSink, RecordingSink};
pub use types::{Applied, Counter, CounterOverflow, SessionConfig, SessionId, SessionState};

pub use waltz_protocol::{SelectionItem, TransferEvent};

/// Errors returned synchronously by the controller.
///
/// Everything that goes wrong after a session has started is reported
/// through the session's terminal message instead.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("a transfer session is already running")]
    AlreadyRunning,

    #[error("selection is empty")]
    EmptySelection,

    #[error("no async runtime available")]
    NoRuntime,
}
