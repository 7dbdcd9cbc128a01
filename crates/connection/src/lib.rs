//! Transport for transfer sessions.
//!
//! Provides the WebSocket channel, the HTTP selection announcement and
//! [`WsConnector`], which plugs both into the transfer controller.

pub mod announce;
pub mod connector;
mod pumps;
pub mod ws_channel;

pub use announce::{SelectionAnnouncer, announce_url_for};
pub use connector::WsConnector;
pub use ws_channel::{ConnectionError, WsChannel};
