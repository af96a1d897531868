use crate::{config::UploadConfig, state::AppState};
use axum::Router;

mod dto;
pub mod handlers;
mod repo;

pub fn router(uploads: &UploadConfig) -> Router<AppState> {
    handlers::project_routes(uploads)
}
