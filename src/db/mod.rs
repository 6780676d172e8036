//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization, pragmas and the `grocery_items` schema
//! - Repository layer for item CRUD and seeding

pub mod migrations;
pub mod repo;

pub use migrations::{init_db, init_schema};
pub use repo::Repository;
