use std::fmt;

use serde::Serialize;

use waltz_protocol::constants::DEFAULT_ENDPOINT;

/// Terminal message of a successful session.
pub const FINISHED_MESSAGE: &str = "Finished";

/// Terminal message of a cancelled session.
pub const CANCELLED_MESSAGE: &str = "cancelled";

/// Terminal message when the channel closes before a terminal event.
pub const CLOSED_MESSAGE: &str = "connection closed unexpectedly";

/// Lifecycle state of a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Created, channel not requested yet.
    Idle,
    /// Channel being opened; no event received yet.
    Connecting,
    /// At least one event received.
    Running,
    /// Server reported `done`.
    Finished,
    /// Error, protocol violation, unexpected close or cancel.
    Failed,
}

impl SessionState {
    /// Returns `true` for `Finished` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    /// Returns `true` while the session owns a channel.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Unique identifier of a session, used in logs and handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Address of the transfer channel.
    pub endpoint: String,
    /// Embed the selection in the start command.
    pub embed_selection: bool,
    /// When the selection is not embedded, post it here before opening
    /// the channel. `None` means the server already knows it.
    pub announce_url: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            embed_selection: false,
            announce_url: None,
        }
    }
}

/// A bounded progress counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Tracks transferred, bounded by the sum of declared totals.
    Units,
    /// Playlists transferred, bounded by the selection length.
    Items,
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Units => "units",
            Self::Items => "items",
        })
    }
}

/// A completion event would push a counter past its declared bound.
///
/// Recoverable: the counter stays clamped and the session continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{counter} counter already at its limit of {limit}")]
pub struct CounterOverflow {
    pub counter: Counter,
    pub limit: u64,
}

/// Outcome of applying one event to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Non-terminal event applied.
    Progress,
    /// Non-terminal event applied, counter clamped.
    Overflow(CounterOverflow),
    /// The event ended the session.
    Terminal,
    /// Session not accepting events; nothing changed.
    Ignored,
}

impl Applied {
    /// Returns `true` if the event changed the session.
    pub fn changed(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}
