//! Content item admin endpoints

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::content::{ContentItem, ItemId};

/// Request to add or replace a content item
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListItemsResponse {
    pub items: Vec<ItemResponse>,
    pub total: usize,
}

impl From<&ContentItem> for ItemResponse {
    fn from(item: &ContentItem) -> Self {
        Self {
            id: item.id().as_str().to_string(),
            name: item.name().to_string(),
            path: item.path().map(|p| p.to_string()),
        }
    }
}

/// GET /admin/items
pub async fn list_items(State(state): State<AppState>) -> Result<Json<ListItemsResponse>, ApiError> {
    debug!("Admin listing content items");

    let items = state.content.list_items().await?;
    let items: Vec<ItemResponse> = items.iter().map(ItemResponse::from).collect();
    let total = items.len();

    Ok(Json(ListItemsResponse { items, total }))
}

/// POST /admin/items
pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    debug!(item_id = %request.id, "Admin saving content item");

    let id = ItemId::new(&request.id)
        .map_err(|e| ApiError::bad_request(e.to_string()).with_param("id"))?;

    let mut item = ContentItem::new(id, request.name);
    if let Some(path) = request.path {
        item = item.with_path(path);
    }

    let saved = state.content.save_item(item).await?;

    Ok(Json(ItemResponse::from(&saved)))
}
