//! Users and invite codes. Registration requires a live invite code; there
//! is deliberately no password or session layer behind these routes.

use axum::{extract::State, Json};
use hearth_store::types::{InviteCode, User};
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::http::{store_error, ApiError};

/// GET /users
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, ApiError> {
    state.users.list().map(Json).map_err(store_error)
}

#[derive(Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub invite_code: String,
}

/// POST /users — redeem an invite code and create the member.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .redeem_invite(&body.invite_code, &body.username)
        .map(Json)
        .map_err(store_error)
}

#[derive(Deserialize)]
pub struct MintBody {
    pub created_by: i64,
}

/// POST /invites — mint a fresh single-use code.
pub async fn mint_invite(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MintBody>,
) -> Result<Json<InviteCode>, ApiError> {
    state
        .users
        .mint_invite(body.created_by)
        .map(Json)
        .map_err(store_error)
}

/// GET /invites — newest first, spent codes included.
pub async fn list_invites(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<InviteCode>>, ApiError> {
    state.users.list_invites().map(Json).map_err(store_error)
}
