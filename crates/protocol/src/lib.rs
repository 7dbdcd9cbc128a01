//! Wire protocol for the playlist transfer channel.
//!
//! Outbound: a single start command, optionally preceded by a
//! `POST /transfer` announcing the selection. Inbound: a stream of
//! `{"type": <kind>, "body": <optional string>}` messages.

pub mod constants;
pub mod envelope;
pub mod events;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::EventKind;
pub use envelope::ServerMessage;
pub use events::TransferEvent;
pub use messages::{Command, StartCommand, TransferRequest};
pub use types::SelectionItem;
