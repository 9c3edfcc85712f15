//! Billing API
//!
//! One path, `/api/billing`, with the operation picked by `?action=`.

mod handler;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/billing", get(handler::query).post(handler::command))
}
