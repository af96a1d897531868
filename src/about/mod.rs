use crate::{config::UploadConfig, state::AppState};
use axum::Router;

pub mod handlers;
mod repo;

pub fn router(uploads: &UploadConfig) -> Router<AppState> {
    handlers::about_routes(uploads)
}
