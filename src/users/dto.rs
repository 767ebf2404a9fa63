use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{User, UserRole, UserStatus};

/// Public view of a user; the password hash never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub coins: i64,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            email: user.email,
            coins: user.coins,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// Request body for the coin deduction endpoint.
#[derive(Debug, Deserialize)]
pub struct DeductRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductResponse {
    pub new_balance: i64,
    pub message: String,
}
