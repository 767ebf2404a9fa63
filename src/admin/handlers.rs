use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{BroadcastRequest, MaintenanceRequest, UpdateUserRequest};
use crate::auth::extractors::AdminUser;
use crate::error::ApiError;
use crate::settings;
use crate::state::AppState;
use crate::users::repo;
use crate::users::UserSummary;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:user_id", patch(update_user))
        .route("/admin/broadcast", post(broadcast))
        .route("/admin/maintenance", post(set_maintenance))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = repo::list_all(&state.db).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    if let Some(coins) = payload.coins {
        if coins < 0 {
            warn!(%user_id, coins, "rejected negative coin balance");
            return Err(ApiError::BadRequest("Coins must be non-negative".into()));
        }
    }

    let user = repo::update_admin_fields(
        &state.db,
        user_id,
        payload.coins,
        payload.status,
        payload.role,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(admin_id = %claims.sub, %user_id, "user updated by admin");
    Ok(Json(user.into()))
}

/// Persists the message only; there is no fan-out to connected clients.
#[instrument(skip(state, payload))]
pub async fn broadcast(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(payload): Json<BroadcastRequest>,
) -> Result<Json<Value>, ApiError> {
    settings::repo::set_broadcast(&state.db, &payload.message).await?;
    info!(admin_id = %claims.sub, "broadcast stored");
    Ok(Json(json!({ "message": "Broadcast sent successfully" })))
}

/// A non-empty message enables maintenance mode; an empty one disables it.
#[instrument(skip(state, payload))]
pub async fn set_maintenance(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(payload): Json<MaintenanceRequest>,
) -> Result<Json<Value>, ApiError> {
    let message = payload.message.trim();
    let enabled = !message.is_empty();
    settings::repo::set_maintenance(&state.db, enabled, if enabled { message } else { "" }).await?;

    info!(admin_id = %claims.sub, enabled, "maintenance mode toggled");
    Ok(Json(json!({
        "message": format!(
            "Maintenance mode {}",
            if enabled { "enabled" } else { "disabled" }
        ),
        "maintenanceMode": enabled,
    })))
}
