pub mod health;
pub mod items;

use crate::coordinator::ListCoordinator;
use crate::db::Repository;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    /// Handlers take the lock for the whole operation, so list actions are
    /// applied one at a time.
    pub coordinator: Arc<Mutex<ListCoordinator>>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, coordinator: ListCoordinator) -> Self {
        Self {
            repo,
            coordinator: Arc::new(Mutex::new(coordinator)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/items", get(items::list_items).post(items::add_item))
        .route("/v1/items/refresh", post(items::refresh))
        .route("/v1/items/:id", put(items::edit_item))
        .route("/v1/items/:id/toggle", post(items::toggle_item))
        .route("/v1/items/:id/delete", post(items::request_delete))
        .route("/v1/deletions/:token/confirm", post(items::confirm_delete))
        .route("/v1/deletions/:token", delete(items::cancel_delete))
        .route("/v1/import", post(items::import))
        .route("/v1/notice", delete(items::dismiss_notice))
        .layer(cors)
        .with_state(state)
}
