use serde::{Deserialize, Serialize};

use crate::constants::EventKind;

/// Envelope for every message the server pushes on the channel.
///
/// `kind` stays a raw string so that unrecognized kinds can be quoted
/// back verbatim in diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ServerMessage {
    /// Creates a message with the given kind and optional body.
    pub fn new(kind: impl Into<String>, body: Option<&str>) -> Self {
        Self {
            kind: kind.into(),
            body: body.map(str::to_owned),
        }
    }

    /// Parses a JSON text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Returns the parsed kind.
    pub fn event_kind(&self) -> EventKind {
        EventKind::parse(&self.kind)
    }
}
