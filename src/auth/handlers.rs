use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::dto::{LoginRequest, LoginResponse, RegisterRequest};
use super::extractors::AuthUser;
use super::jwt::JwtKeys;
use super::password;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::{self, UserStatus};
use crate::users::UserSummary;

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        warn!("registration with missing fields");
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    // One generic conflict message; the response must not disclose which
    // field collided.
    if repo::find_by_username_or_email(&state.db, &payload.username, &payload.email)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "duplicate registration attempt");
        return Err(ApiError::Conflict("Username or email already exists".into()));
    }

    let hash = password::hash_password(&payload.password)?;
    let user = match repo::create(&state.db, &payload.username, &payload.email, &hash).await {
        Ok(user) => user,
        // The pre-check above races with concurrent registrations; the
        // losing insert is still a duplicate, not a server error.
        Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
            warn!(username = %payload.username, "duplicate registration lost the insert race");
            return Err(ApiError::Conflict("Username or email already exists".into()));
        }
        Err(e) => return Err(ApiError::Internal(e.into())),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Unknown username and wrong password produce the exact same response;
    // anything else would let callers enumerate accounts.
    let user = match repo::find_by_username(&state.db, &payload.username).await? {
        Some(user) => user,
        None => {
            warn!(username = %payload.username, "login with unknown username");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    if user.status != UserStatus::Active {
        warn!(user_id = %user.id, status = %user.status, "login blocked by account status");
        return Err(ApiError::Forbidden(format!("Account is {}", user.status)));
    }

    if !password::verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/verify
///
/// Re-fetches the live record so coins and role reflect current state, not
/// the snapshot baked into the token.
#[instrument(skip(state))]
pub async fn verify(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserSummary>, ApiError> {
    let user = repo::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user.into()))
}
