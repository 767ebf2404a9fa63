use serde::Deserialize;

use crate::users::repo::{UserRole, UserStatus};

/// Allow-listed partial update for admin edits. Anything outside these
/// three fields is rejected by deserialization, which closes the
/// privilege-escalation hole of a free-form patch payload.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub coins: Option<i64>,
    pub status: Option<UserStatus>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    /// Empty or absent message disables maintenance mode.
    #[serde(default)]
    pub message: String,
}
