use serde::{Deserialize, Serialize};

use crate::types::SelectionItem;

// ---------------------------------------------------------------------------
// Channel commands
// ---------------------------------------------------------------------------

/// Command verbs accepted on the transfer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    #[serde(rename = "START")]
    Start,
}

/// The one command a session sends after the channel opens.
///
/// `playlists` is only present when the selection is embedded in the
/// command rather than announced beforehand over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartCommand {
    pub command: Command,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlists: Option<Vec<SelectionItem>>,
}

impl StartCommand {
    /// A bare start command; the server already knows the selection.
    pub fn bare() -> Self {
        Self {
            command: Command::Start,
            playlists: None,
        }
    }

    /// A start command carrying the selection.
    pub fn with_selection(items: &[SelectionItem]) -> Self {
        Self {
            command: Command::Start,
            playlists: Some(items.to_vec()),
        }
    }

    /// Encodes the command as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// HTTP payloads
// ---------------------------------------------------------------------------

/// Body of `POST /transfer`, announcing the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub playlists: Vec<SelectionItem>,
}
