use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    auth::{
        claims::AdminPrincipal,
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        repo_types::PublicUser,
        services,
    },
    error::ApiResult,
    extract::Json,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[instrument(skip(state, admin, payload))]
pub async fn register(
    State(state): State<AppState>,
    admin: Option<AdminPrincipal>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let user = services::register(
        state.users.as_ref(),
        state.config.auth.default_role,
        admin.as_ref(),
        payload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let res = services::login(state.users.as_ref(), &state.jwt, payload).await?;
    Ok(Json(res))
}

#[instrument(skip(admin), fields(user_id = %admin.user_id))]
pub async fn me(admin: AdminPrincipal) -> Json<AdminPrincipal> {
    Json(admin)
}
