pub mod api;
pub mod config;
pub mod coordinator;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod error;

pub use config::Config;
pub use coordinator::{ListCoordinator, Notice, NoticeLevel, PendingDeletion};
pub use datasource::{DataSourceError, HttpListSource, ListSource, MockListSource};
pub use db::{init_db, Repository};
pub use domain::{GroceryDraft, GroceryItem, ItemId, TimeMs};
pub use error::{AppError, GroceryError};
