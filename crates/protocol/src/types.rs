use serde::{Deserialize, Serialize};

/// A playlist picked for transfer.
///
/// `total_units` is the number of tracks the server is expected to move
/// for this playlist. It may be `0` when the provider did not report a
/// count up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub total_units: u64,
}

impl SelectionItem {
    /// Creates a selection item.
    pub fn new(id: impl Into<String>, name: impl Into<String>, total_units: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            total_units,
        }
    }
}
