use crate::datasource::DataSourceError;
use crate::domain::ItemId;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of list operations.
#[derive(Debug, Error)]
pub enum GroceryError {
    /// Rejected before touching the store.
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Item {0} not found")]
    NotFound(ItemId),
    #[error("Unknown or expired confirmation token: {0}")]
    UnknownToken(String),
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("Import failed: {0}")]
    Network(#[from] DataSourceError),
    /// Rows inserted before the failure stay in the store.
    #[error("Import stopped after {inserted} of {attempted} items: {source}")]
    PartialImport {
        inserted: usize,
        attempted: usize,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<GroceryError> for AppError {
    fn from(err: GroceryError) -> Self {
        let message = err.to_string();
        match err {
            GroceryError::Validation(msg) => AppError::BadRequest(msg),
            GroceryError::NotFound(_) | GroceryError::UnknownToken(_) => {
                AppError::NotFound(message)
            }
            GroceryError::Network(_) => AppError::Upstream(message),
            GroceryError::Storage(_) | GroceryError::PartialImport { .. } => {
                AppError::Internal(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grocery_error_maps_to_status() {
        let cases = [
            (
                GroceryError::Validation("Item name must not be empty".into()),
                StatusCode::BAD_REQUEST,
            ),
            (GroceryError::NotFound(ItemId::new(3)), StatusCode::NOT_FOUND),
            (
                GroceryError::UnknownToken("abc".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                GroceryError::Network(DataSourceError::RateLimited),
                StatusCode::BAD_GATEWAY,
            ),
            (
                GroceryError::Storage(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = AppError::from(GroceryError::Validation("Item name must not be empty".into()));
        assert_eq!(err.to_string(), "Bad request: Item name must not be empty");
    }

    #[test]
    fn test_partial_import_message() {
        let err = GroceryError::PartialImport {
            inserted: 2,
            attempted: 5,
            source: sqlx::Error::PoolClosed,
        };
        assert!(err.to_string().starts_with("Import stopped after 2 of 5 items"));
    }
}
