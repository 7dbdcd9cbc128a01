//! Reads the playlist selection from a JSON file.

use std::path::Path;

use anyhow::{Context, bail};

use waltz_protocol::SelectionItem;

/// Loads a JSON array of `{"id", "name", "totalUnits"}` objects.
pub fn load(path: &Path) -> anyhow::Result<Vec<SelectionItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read selection {}", path.display()))?;
    let items: Vec<SelectionItem> = serde_json::from_str(&content)
        .with_context(|| format!("invalid selection in {}", path.display()))?;
    if items.is_empty() {
        bail!("selection {} is empty", path.display());
    }
    Ok(items)
}
