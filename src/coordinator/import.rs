//! Mapping of remote list records to drafts.

use crate::domain::{name_key, quantity_from_value, GroceryDraft, GroceryItem};
use serde::Serialize;
use std::collections::HashSet;

/// Name given to remote records without a usable name.
pub const PLACEHOLDER_NAME: &str = "Unknown Item";

/// Category stamped on every imported item.
pub const IMPORTED_CATEGORY: &str = "Imported";

/// Result of a completed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    /// Records in the remote payload.
    pub fetched: usize,
    /// Rows written to the store.
    pub inserted: usize,
    /// Records dropped as duplicates: names already on the list, and
    /// repeats of a name earlier in the same payload.
    pub skipped: usize,
}

/// Build a draft from one remote record, applying defaults for anything
/// missing or malformed.
pub fn draft_from_record(record: &serde_json::Value) -> GroceryDraft {
    let name = record
        .get("name")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER_NAME);
    let quantity = quantity_from_value(record.get("quantity"));
    let bought = record.get("completed").and_then(serde_json::Value::as_bool) == Some(true);

    GroceryDraft::new(name, quantity, IMPORTED_CATEGORY).with_bought(bought)
}

/// Keep drafts whose name is not already on the list.
///
/// Names compare trimmed and case-insensitively. A name repeated inside the
/// payload is kept only the first time.
pub fn select_new(drafts: Vec<GroceryDraft>, existing: &[GroceryItem]) -> Vec<GroceryDraft> {
    let mut seen: HashSet<String> = existing.iter().map(GroceryItem::name_key).collect();
    drafts
        .into_iter()
        .filter(|draft| seen.insert(name_key(&draft.name)))
        .collect()
}
