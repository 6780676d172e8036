//! Domain types for the grocery list.
//!
//! This module provides:
//! - Domain primitives: ItemId, TimeMs
//! - GroceryItem (persisted row) and GroceryDraft (not yet inserted)
//! - Quantity parsing shared by form input and remote import

pub mod item;
pub mod primitives;

pub use item::{
    default_samples, name_key, parse_quantity, quantity_from_value, GroceryDraft, GroceryItem,
    DEFAULT_QUANTITY,
};
pub use primitives::{ItemId, TimeMs};
