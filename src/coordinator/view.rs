//! Derived views over the in-memory mirror.

use crate::domain::GroceryItem;
use serde::Serialize;

/// Items whose name contains `query`, ignoring case.
///
/// The query is trimmed first; a blank query keeps every item. Order is
/// preserved.
pub fn filter_by_name<'a>(items: &'a [GroceryItem], query: &str) -> Vec<&'a GroceryItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .collect()
}

/// Item and bought counts shown in the list header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListStats {
    pub total: usize,
    pub bought: usize,
}

impl ListStats {
    pub fn of<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a GroceryItem>,
    {
        items.into_iter().fold(ListStats::default(), |mut stats, item| {
            stats.total += 1;
            if item.bought {
                stats.bought += 1;
            }
            stats
        })
    }
}
