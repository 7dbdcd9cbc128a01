//! Read-only display view of a session.

use std::fmt;

use serde::Serialize;

use crate::session::TransferSession;
use crate::types::SessionState;

/// What a progress surface shows for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub session_id: String,
    pub state: SessionState,
    pub current_item: Option<String>,
    pub items_transferred: usize,
    pub total_items: usize,
    pub units_transferred: u64,
    pub total_units: u64,
    pub terminal_message: Option<String>,
}

/// Projects a session onto its display values. Pure.
pub fn project(session: &TransferSession) -> ProgressView {
    ProgressView {
        session_id: session.id().to_string(),
        state: session.state(),
        current_item: session.current_item().map(str::to_owned),
        items_transferred: session.items_transferred(),
        total_items: session.items().len(),
        units_transferred: session.units_transferred(),
        total_units: session.total_units(),
        terminal_message: session.terminal_message().map(str::to_owned),
    }
}

impl ProgressView {
    /// Fraction of tracks transferred, in `0.0..=1.0`.
    ///
    /// Falls back to the playlist ratio when no track totals were declared.
    pub fn fraction(&self) -> f64 {
        if self.total_units > 0 {
            self.units_transferred as f64 / self.total_units as f64
        } else if self.total_items > 0 {
            self.items_transferred as f64 / self.total_items as f64
        } else {
            0.0
        }
    }
}

impl fmt::Display for ProgressView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | playlists {}/{} | tracks {}/{} | ",
            self.current_item.as_deref().unwrap_or("-"),
            self.items_transferred,
            self.total_items,
            self.units_transferred,
            self.total_units,
        )?;
        match &self.terminal_message {
            Some(message) => f.write_str(message),
            None => write!(f, "{}", self.state),
        }
    }
}
