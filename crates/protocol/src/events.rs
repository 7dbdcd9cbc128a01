//! Typed view of inbound server events.

use crate::constants::{EventKind, MAX_QUOTED_FRAME};
use crate::envelope::ServerMessage;

/// Body used for an `error` event that carries no message.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// One event pushed by the server during a transfer.
///
/// Closed over the known kinds plus [`TransferEvent::Unknown`], which
/// carries anything the client does not understand, including frames
/// that are not valid JSON at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// The server started working on a playlist.
    ItemStart { name: String },
    /// One track was transferred.
    UnitDone,
    /// One playlist was transferred.
    ItemDone,
    /// The whole transfer finished.
    Done,
    /// The server gave up.
    Error { message: String },
    /// Protocol violation: an unrecognized kind or an unparseable frame.
    Unknown { kind: String },
}

impl TransferEvent {
    /// Decodes a text frame.
    ///
    /// Never fails: a frame that does not parse becomes
    /// [`TransferEvent::Unknown`] quoting (a prefix of) the raw text.
    pub fn decode(text: &str) -> Self {
        match ServerMessage::parse(text) {
            Ok(msg) => msg.into(),
            Err(_) => Self::Unknown {
                kind: quote(text),
            },
        }
    }

    /// Returns `true` for events that end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. } | Self::Unknown { .. })
    }

    /// Returns the wire kind of this event.
    pub fn kind(&self) -> &str {
        match self {
            Self::ItemStart { .. } => "item-start",
            Self::UnitDone => "unit-done",
            Self::ItemDone => "item-done",
            Self::Done => "done",
            Self::Error { .. } => "error",
            Self::Unknown { kind } => kind,
        }
    }
}

impl From<ServerMessage> for TransferEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg.event_kind() {
            EventKind::ItemStart => Self::ItemStart {
                name: msg.body.unwrap_or_default(),
            },
            EventKind::UnitDone => Self::UnitDone,
            EventKind::ItemDone => Self::ItemDone,
            EventKind::Done => Self::Done,
            EventKind::Error => Self::Error {
                message: msg
                    .body
                    .filter(|b| !b.is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            },
            EventKind::Unknown => Self::Unknown { kind: msg.kind },
        }
    }
}

/// Truncates `raw` to [`MAX_QUOTED_FRAME`] characters.
fn quote(raw: &str) -> String {
    raw.chars().take(MAX_QUOTED_FRAME).collect()
}
