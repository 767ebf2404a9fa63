mod dto;
pub mod handlers;
pub mod repo;

pub use dto::UserSummary;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::coin_routes()
}
