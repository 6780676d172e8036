//! Grocery item and draft types.

use crate::domain::{ItemId, TimeMs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quantity used whenever the entered value is missing, unparsable or zero.
pub const DEFAULT_QUANTITY: i64 = 1;

/// A persisted grocery item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryItem {
    /// Store-assigned identifier, immutable after insert.
    pub id: ItemId,
    pub name: String,
    pub quantity: i64,
    /// Free-form tag; empty when not set.
    pub category: String,
    pub bought: bool,
    pub created_at: DateTime<Utc>,
}

impl GroceryItem {
    /// Name key used for duplicate detection: trimmed and lower-cased.
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    /// Copy with the `bought` flag flipped.
    pub fn toggled(&self) -> Self {
        GroceryItem {
            bought: !self.bought,
            ..self.clone()
        }
    }
}

/// A candidate item that has no store-assigned id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryDraft {
    pub name: String,
    pub quantity: i64,
    pub category: String,
    pub bought: bool,
    pub created_at: TimeMs,
}

impl GroceryDraft {
    /// New unbought draft stamped with the current time.
    pub fn new(name: impl Into<String>, quantity: i64, category: impl Into<String>) -> Self {
        GroceryDraft {
            name: name.into(),
            quantity,
            category: category.into(),
            bought: false,
            created_at: TimeMs::now(),
        }
    }

    /// Set the `bought` flag.
    pub fn with_bought(mut self, bought: bool) -> Self {
        self.bought = bought;
        self
    }

    /// Trim name and category the way a form submission does.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self
    }
}

/// Trimmed, lower-cased form of a name.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Parse a quantity entered as text.
///
/// Reads an optional sign and the leading run of digits after any leading
/// whitespace, ignoring whatever follows (`"3 packs"` is 3). Anything that
/// yields no number, or yields zero, becomes [`DEFAULT_QUANTITY`].
pub fn parse_quantity(input: &str) -> i64 {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return DEFAULT_QUANTITY;
    }

    match rest[..digits_len].parse::<i64>() {
        Ok(0) | Err(_) => DEFAULT_QUANTITY,
        Ok(n) if negative => -n,
        Ok(n) => n,
    }
}

/// Parse a quantity carried in a JSON value (number or text).
pub fn quantity_from_value(value: Option<&serde_json::Value>) -> i64 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(serde_json::Value::String(s)) => Some(parse_quantity(s)),
        _ => None,
    };

    match parsed {
        Some(0) | None => DEFAULT_QUANTITY,
        Some(n) => n,
    }
}

/// Sample rows inserted into an empty store.
pub fn default_samples() -> Vec<GroceryDraft> {
    vec![
        GroceryDraft::new("Sữa", 1, "Dairy"),
        GroceryDraft::new("Trứng", 12, "Protein"),
        GroceryDraft::new("Bánh mì", 1, "Bakery"),
    ]
}
