//! Shared shopping list — GET/POST /shopping, POST /shopping/{id}/toggle,
//! DELETE /shopping/{id}, POST /shopping/clear-checked.

use axum::{
    extract::{Path, State},
    Json,
};
use hearth_store::types::ShoppingItem;
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::http::{store_error, ApiError};

/// GET /shopping — unchecked items first.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ShoppingItem>>, ApiError> {
    state.shopping.list().map(Json).map_err(store_error)
}

#[derive(Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub added_by: i64,
}

/// POST /shopping
pub async fn add(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewItem>,
) -> Result<Json<ShoppingItem>, ApiError> {
    state
        .shopping
        .add(&new.name, new.category.as_deref(), new.added_by)
        .map(Json)
        .map_err(store_error)
}

/// POST /shopping/{id}/toggle
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ShoppingItem>, ApiError> {
    state.shopping.toggle(id).map(Json).map_err(store_error)
}

/// DELETE /shopping/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.shopping.remove(id).map_err(store_error)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// POST /shopping/clear-checked — remove everything already ticked off.
pub async fn clear_checked(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cleared = state.shopping.clear_checked().map_err(store_error)?;
    Ok(Json(serde_json::json!({ "cleared": cleared })))
}
