use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use super::repo;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStatus {
    pub maintenance_mode: bool,
    pub message: String,
}

pub fn maintenance_routes() -> Router<AppState> {
    Router::new().route("/maintenance", get(maintenance_status))
}

/// GET /api/maintenance — public probe; defaults apply until the settings
/// row exists.
#[instrument(skip(state))]
pub async fn maintenance_status(
    State(state): State<AppState>,
) -> Result<Json<MaintenanceStatus>, ApiError> {
    let settings = repo::get(&state.db).await?;
    let (maintenance_mode, message) = settings
        .map(|s| (s.maintenance_mode, s.maintenance_message))
        .unwrap_or((false, String::new()));
    Ok(Json(MaintenanceStatus {
        maintenance_mode,
        message,
    }))
}
