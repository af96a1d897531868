use axum::{
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tracing::{info, instrument};

use super::repo::{self, About, AboutInput};
use crate::{
    auth::AdminPrincipal,
    config::UploadConfig,
    error::ApiResult,
    extract::{Json, Multipart},
    state::AppState,
    uploads::{read_multipart, remove_files, store_files, UploadRule},
};

fn resume_rule(cfg: &UploadConfig) -> UploadRule {
    UploadRule {
        field: "resume",
        dir: "resumes",
        max_files: 1,
        max_bytes: cfg.max_resume_bytes,
        images_only: false,
    }
}

pub fn about_routes(cfg: &UploadConfig) -> Router<AppState> {
    Router::new()
        .route("/about", get(get_about).post(upsert_about).put(upsert_about))
        .layer(DefaultBodyLimit::max(cfg.max_resume_bytes + 64 * 1024))
}

#[instrument(skip(state))]
pub async fn get_about(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(match repo::find(&state.db).await? {
        Some(about) => Json(about).into_response(),
        None => Json(json!({})).into_response(),
    })
}

/// Multipart: `content`, `frontendFocus`, `performance` and an optional
/// `resume` file.
#[instrument(skip(state, admin, mp), fields(admin_id = %admin.user_id))]
pub async fn upsert_about(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Multipart(mp): Multipart,
) -> ApiResult<Json<About>> {
    let rule = resume_rule(&state.config.uploads);
    let mut form = read_multipart(mp, &rule).await?;

    let resume_path = store_files(state.storage.as_ref(), &rule, std::mem::take(&mut form.files))
        .await?
        .into_iter()
        .next();

    let input = AboutInput {
        content: form.text("content").map(str::to_string),
        frontend_focus: form.text("frontendFocus").map(str::to_string),
        performance: form.text("performance").map(str::to_string),
        resume_path,
    };

    let (about, replaced) = match repo::upsert(&state.db, &input).await {
        Ok(v) => v,
        Err(e) => {
            // keep disk in step with the row that failed to save
            if let Some(path) = input.resume_path {
                remove_files(state.storage.as_ref(), &[path]).await;
            }
            return Err(e.into());
        }
    };

    if let Some(old) = replaced {
        remove_files(state.storage.as_ref(), &[old]).await;
    }

    info!(about_id = %about.id, "about updated");
    Ok(Json(about))
}
