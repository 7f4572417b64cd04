//! Task CRUD — GET/POST /tasks, PUT/DELETE /tasks/{id},
//! POST /tasks/{id}/toggle, plus the category list.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use hearth_store::types::{NewTask, Task, TaskCategory, TaskFilter};
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::http::{store_error, ApiError};

#[derive(Deserialize)]
pub struct ListQuery {
    /// open (default) | done | all
    #[serde(default)]
    pub show: TaskFilter,
}

/// GET /tasks — all tasks ordered by due date, filtered by completion.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    state.tasks.list(query.show).map(Json).map_err(store_error)
}

/// POST /tasks — create a plain task or a recurrence template.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewTask>,
) -> Result<Json<Task>, ApiError> {
    state.tasks.create(&new).map(Json).map_err(store_error)
}

/// PUT /tasks/{id} — overwrite the editable fields.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(new): Json<NewTask>,
) -> Result<Json<Task>, ApiError> {
    state.tasks.update(id, &new).map(Json).map_err(store_error)
}

#[derive(Deserialize, Default)]
pub struct ToggleBody {
    /// Who ticked the box; recorded as the completer when marking done.
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// POST /tasks/{id}/toggle — flip completion state.
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Option<Json<ToggleBody>>,
) -> Result<Json<Task>, ApiError> {
    let user_id = body.map(|Json(b)| b.user_id).unwrap_or_default();
    state
        .tasks
        .toggle(id, user_id)
        .map(Json)
        .map_err(store_error)
}

/// DELETE /tasks/{id} — spawned instances of a deleted template live on.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.tasks.delete(id).map_err(store_error)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// GET /categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TaskCategory>>, ApiError> {
    state.tasks.list_categories().map(Json).map_err(store_error)
}

#[derive(Deserialize)]
pub struct NewCategory {
    pub name: String,
}

/// POST /categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewCategory>,
) -> Result<Json<TaskCategory>, ApiError> {
    state
        .tasks
        .create_category(&new.name)
        .map(Json)
        .map_err(store_error)
}
