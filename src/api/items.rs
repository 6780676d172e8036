use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::coordinator::{filter_by_name, ImportOutcome, ListStats, Notice};
use crate::domain::{quantity_from_value, GroceryDraft, GroceryItem, ItemId};
use crate::error::{AppError, GroceryError};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub category: String,
    pub bought: bool,
    pub created_at: DateTime<Utc>,
    pub created_at_ms: i64,
}

impl From<&GroceryItem> for ItemDto {
    fn from(item: &GroceryItem) -> Self {
        ItemDto {
            id: item.id.as_i64(),
            name: item.name.clone(),
            quantity: item.quantity,
            category: item.category.clone(),
            bought: item.bought,
            created_at: item.created_at,
            created_at_ms: item.created_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub query: String,
    pub items: Vec<ItemDto>,
    /// Counts over `items`.
    pub visible: ListStats,
    /// Counts over the whole list.
    pub overall: ListStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

/// Add form. `quantity` may be a number or the raw text of an input field.
#[derive(Debug, Deserialize)]
pub struct ItemForm {
    #[serde(default)]
    pub name: String,
    pub quantity: Option<serde_json::Value>,
    pub category: Option<String>,
}

/// Edit form. Omitted fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct EditForm {
    pub name: Option<String>,
    pub quantity: Option<serde_json::Value>,
    pub category: Option<String>,
    pub bought: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub item: ItemDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionResponse {
    pub token: Uuid,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    #[serde(flatten)]
    pub outcome: ImportOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

pub async fn list_items(
    Query(params): Query<ListQuery>,
    State(state): State<AppState>,
) -> Json<ListResponse> {
    let coordinator = state.coordinator.lock().await;
    let query = params.q.unwrap_or_default();
    let visible = filter_by_name(coordinator.items(), &query);

    Json(ListResponse {
        visible: ListStats::of(visible.iter().copied()),
        items: visible.into_iter().map(ItemDto::from).collect(),
        overall: coordinator.stats(),
        notice: coordinator.notice().cloned(),
        query,
    })
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<ListResponse>, AppError> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.load().await?;

    let items: Vec<ItemDto> = coordinator.items().iter().map(ItemDto::from).collect();
    Ok(Json(ListResponse {
        query: String::new(),
        items,
        visible: coordinator.stats(),
        overall: coordinator.stats(),
        notice: coordinator.take_notice(),
    }))
}

pub async fn add_item(
    State(state): State<AppState>,
    Json(form): Json<ItemForm>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    let draft = GroceryDraft::new(
        form.name,
        quantity_from_value(form.quantity.as_ref()),
        form.category.unwrap_or_default(),
    );

    let mut coordinator = state.coordinator.lock().await;
    let id = coordinator.add(draft).await?;
    let item = coordinator
        .get(id)
        .map(ItemDto::from)
        .ok_or(GroceryError::NotFound(id))?;

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            item,
            notice: coordinator.take_notice(),
        }),
    ))
}

pub async fn edit_item(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(form): Json<EditForm>,
) -> Result<Json<ItemResponse>, AppError> {
    let id = ItemId::new(id);
    let mut coordinator = state.coordinator.lock().await;
    let current = coordinator
        .get(id)
        .cloned()
        .ok_or(GroceryError::NotFound(id))?;

    let edited = GroceryItem {
        name: form.name.unwrap_or(current.name),
        quantity: form
            .quantity
            .as_ref()
            .map(|q| quantity_from_value(Some(q)))
            .unwrap_or(current.quantity),
        category: form.category.unwrap_or(current.category),
        bought: form.bought.unwrap_or(current.bought),
        ..current
    };

    let stored = coordinator.edit(edited).await?;
    Ok(Json(ItemResponse {
        item: ItemDto::from(&stored),
        notice: coordinator.take_notice(),
    }))
}

pub async fn toggle_item(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ItemResponse>, AppError> {
    let mut coordinator = state.coordinator.lock().await;
    let toggled = coordinator.toggle_bought(ItemId::new(id)).await?;
    Ok(Json(ItemResponse {
        item: ItemDto::from(&toggled),
        notice: coordinator.take_notice(),
    }))
}

pub async fn request_delete(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Json<DeletionResponse> {
    let mut coordinator = state.coordinator.lock().await;
    let pending = coordinator.request_delete(ItemId::new(id));
    Json(DeletionResponse {
        prompt: pending.prompt(),
        token: pending.token,
        id: pending.id.as_i64(),
        name: pending.name,
    })
}

pub async fn confirm_delete(
    Path(token): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let mut coordinator = state.coordinator.lock().await;
    let removed = coordinator.confirm_delete(token).await?;
    Ok(Json(ConfirmResponse {
        removed,
        notice: coordinator.take_notice(),
    }))
}

pub async fn cancel_delete(
    Path(token): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let mut coordinator = state.coordinator.lock().await;
    if coordinator.cancel_delete(token) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(GroceryError::UnknownToken(token.to_string()).into())
    }
}

/// Dismiss the current notice.
pub async fn dismiss_notice(State(state): State<AppState>) -> StatusCode {
    state.coordinator.lock().await.take_notice();
    StatusCode::NO_CONTENT
}

pub async fn import(State(state): State<AppState>) -> Result<Json<ImportResponse>, AppError> {
    let mut coordinator = state.coordinator.lock().await;
    let outcome = coordinator.import_from_remote().await?;
    Ok(Json(ImportResponse {
        outcome,
        notice: coordinator.take_notice(),
    }))
}
