use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
mod repo_types;
pub mod services;

pub use claims::AdminPrincipal;
pub use jwt::JwtKeys;
pub use repo::{PgUserStore, UserStore};
pub use repo_types::Role;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
