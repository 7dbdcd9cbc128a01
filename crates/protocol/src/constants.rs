use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default address of the transfer channel.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/transferSocket";

/// Path of the request/response endpoint that accepts the selection
/// ahead of the channel opening.
pub const TRANSFER_PATH: &str = "/transfer";

/// Time to wait for a pong response (or any incoming message).
///
/// Acts as a read deadline: if *nothing* arrives within this window the
/// connection is considered dead. The server may take a while between
/// tracks on large playlists, so this is generous.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// How often to send pings.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(15);

/// Maximum inbound message size in bytes (1 MB). Events are tiny.
pub const WS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Timeout for plain request/response calls.
pub const WS_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of characters of an offending frame quoted back in a
/// protocol violation message.
pub const MAX_QUOTED_FRAME: usize = 64;

/// Kind of an inbound server event.
///
/// Unrecognized kinds deserialize to [`EventKind::Unknown`]; callers that
/// need the raw string keep it from the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "item-start")]
    ItemStart,
    #[serde(rename = "unit-done")]
    UnitDone,
    #[serde(rename = "item-done")]
    ItemDone,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "error")]
    Error,

    /// Forward compatibility: unknown kinds deserialize here.
    #[serde(other)]
    Unknown,
}

impl EventKind {
    /// Parses a wire kind string.
    pub fn parse(kind: &str) -> Self {
        match kind {
            "item-start" => Self::ItemStart,
            "unit-done" => Self::UnitDone,
            "item-done" => Self::ItemDone,
            "done" => Self::Done,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Returns the wire name, or `None` for [`EventKind::Unknown`].
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Self::ItemStart => Some("item-start"),
            Self::UnitDone => Some("unit-done"),
            Self::ItemDone => Some("item-done"),
            Self::Done => Some("done"),
            Self::Error => Some("error"),
            Self::Unknown => None,
        }
    }
}
