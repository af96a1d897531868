use crate::state::AppState;
use axum::Router;

pub mod handlers;
mod repo;

pub fn router() -> Router<AppState> {
    handlers::contact_routes()
}
