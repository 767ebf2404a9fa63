use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use super::dto::{DeductRequest, DeductResponse};
use super::repo;
use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn coin_routes() -> Router<AppState> {
    Router::new().route("/user/deduct-coins", post(deduct_coins))
}

/// POST /api/user/deduct-coins
///
/// The sufficiency check and the subtraction happen in one conditional
/// update, so simultaneous requests against the same balance cannot
/// overdraft it.
#[instrument(skip(state, payload))]
pub async fn deduct_coins(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<DeductRequest>,
) -> Result<Json<DeductResponse>, ApiError> {
    if payload.amount <= 0 {
        warn!(amount = payload.amount, "rejected non-positive deduction");
        return Err(ApiError::BadRequest(
            "Amount must be a positive integer".into(),
        ));
    }

    match repo::deduct_coins(&state.db, claims.sub, payload.amount).await? {
        Some(new_balance) => {
            info!(user_id = %claims.sub, amount = payload.amount, new_balance, "coins deducted");
            Ok(Json(DeductResponse {
                new_balance,
                message: format!("Deducted {} coins successfully", payload.amount),
            }))
        }
        None => {
            // Zero rows updated: tell an unknown user apart from a balance
            // that was simply too small.
            if repo::find_by_id(&state.db, claims.sub).await?.is_none() {
                Err(ApiError::NotFound("User not found".into()))
            } else {
                warn!(user_id = %claims.sub, amount = payload.amount, "insufficient coins");
                Err(ApiError::BadRequest("Insufficient coins".into()))
            }
        }
    }
}
