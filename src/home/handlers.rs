use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tracing::{info, instrument};

use super::repo::{self, HomeInput};
use crate::{auth::AdminPrincipal, error::ApiResult, extract::Json, state::AppState};

pub fn home_routes() -> Router<AppState> {
    Router::new().route("/home", get(get_home).post(upsert_home).put(upsert_home))
}

#[instrument(skip(state))]
pub async fn get_home(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(match repo::find(&state.db).await? {
        Some(home) => Json(home).into_response(),
        None => Json(json!({})).into_response(),
    })
}

#[instrument(skip(state, admin, input), fields(admin_id = %admin.user_id))]
pub async fn upsert_home(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Json(input): Json<HomeInput>,
) -> ApiResult<Json<repo::Home>> {
    let home = repo::upsert(&state.db, &input).await?;
    info!(home_id = %home.id, "home updated");
    Ok(Json(home))
}
