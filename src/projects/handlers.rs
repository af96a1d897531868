use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{parse_flag, parse_list},
    repo::{self, NewProject, Project, ProjectChanges},
};
use crate::{
    auth::AdminPrincipal,
    config::UploadConfig,
    error::{ApiError, ApiResult},
    extract::{Json, Multipart, Path},
    state::AppState,
    uploads::{read_multipart, remove_files, store_files, MultipartForm, UploadRule},
};

const MAX_IMAGES: usize = 6;

fn image_rule(cfg: &UploadConfig) -> UploadRule {
    UploadRule {
        field: "images",
        dir: "projects",
        max_files: MAX_IMAGES,
        max_bytes: cfg.max_image_bytes,
        images_only: true,
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectList {
    pub items: Vec<Project>,
}

pub fn project_routes(cfg: &UploadConfig) -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .layer(DefaultBodyLimit::max(MAX_IMAGES * cfg.max_image_bytes + 64 * 1024))
}

fn opt_text(form: &MultipartForm, name: &str) -> Option<String> {
    form.text(name)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[instrument(skip(state))]
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<ProjectList>> {
    let items = repo::list(&state.db).await?;
    Ok(Json(ProjectList { items }))
}

#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    repo::get(&state.db, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Project not found"))
}

/// Multipart: text fields plus up to six `images` files.
#[instrument(skip(state, admin, mp), fields(admin_id = %admin.user_id))]
pub async fn create_project(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Multipart(mp): Multipart,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let rule = image_rule(&state.config.uploads);
    let mut form = read_multipart(mp, &rule).await?;

    let title = opt_text(&form, "title").ok_or_else(|| ApiError::validation("Title is required"))?;

    let images = store_files(state.storage.as_ref(), &rule, std::mem::take(&mut form.files)).await?;

    let new = NewProject {
        title,
        description: opt_text(&form, "description"),
        tech_stack: parse_list(form.text("techStack")),
        repo_link: opt_text(&form, "repoLink"),
        demo_link: opt_text(&form, "demoLink"),
        featured: parse_flag(form.text("featured")),
        images,
    };

    let project = match repo::create(&state.db, &new).await {
        Ok(p) => p,
        Err(e) => {
            remove_files(state.storage.as_ref(), &new.images).await;
            return Err(e.into());
        }
    };

    info!(project_id = %project.id, images = project.images.len(), "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// Existing images not listed in `imagesToKeep` are removed; new uploads
/// are appended. Without `imagesToKeep` every existing image is kept.
#[instrument(skip(state, admin, mp), fields(admin_id = %admin.user_id))]
pub async fn update_project(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(id): Path<Uuid>,
    Multipart(mp): Multipart,
) -> ApiResult<Json<Project>> {
    let rule = image_rule(&state.config.uploads);
    let mut form = read_multipart(mp, &rule).await?;

    let existing = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project not found"))?;

    let (keep, drop) = split_images(&existing.images, form.text("imagesToKeep"));
    if keep.len() + form.files.len() > MAX_IMAGES {
        return Err(ApiError::validation(format!(
            "A project can hold at most {MAX_IMAGES} images"
        )));
    }

    let added = store_files(state.storage.as_ref(), &rule, std::mem::take(&mut form.files)).await?;

    let changes = ProjectChanges {
        title: opt_text(&form, "title"),
        description: opt_text(&form, "description"),
        tech_stack: form.text("techStack").map(|raw| parse_list(Some(raw))),
        repo_link: opt_text(&form, "repoLink"),
        demo_link: opt_text(&form, "demoLink"),
        featured: form.text("featured").map(|raw| parse_flag(Some(raw))),
        images: keep.into_iter().chain(added.iter().cloned()).collect(),
    };

    let updated = match repo::update(&state.db, id, &changes).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            remove_files(state.storage.as_ref(), &added).await;
            return Err(ApiError::NotFound("Project not found"));
        }
        Err(e) => {
            remove_files(state.storage.as_ref(), &added).await;
            return Err(e.into());
        }
    };

    remove_files(state.storage.as_ref(), &drop).await;
    info!(
        project_id = %id,
        added = added.len(),
        removed = drop.len(),
        "project updated"
    );
    Ok(Json(updated))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
pub async fn delete_project(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let Some(project) = repo::delete(&state.db, id).await? else {
        warn!(project_id = %id, "delete of missing project");
        return Err(ApiError::NotFound("Project not found"));
    };
    remove_files(state.storage.as_ref(), &project.images).await;
    info!(project_id = %id, "project deleted");
    Ok(Json(json!({ "message": "Deleted successfully" })))
}

/// Splits stored images into (kept, removed). Entries in `keep_raw` that do
/// not belong to the project are ignored.
fn split_images(existing: &[String], keep_raw: Option<&str>) -> (Vec<String>, Vec<String>) {
    let Some(raw) = keep_raw else {
        return (existing.to_vec(), Vec::new());
    };
    let wanted = parse_list(Some(raw));
    existing
        .iter()
        .cloned()
        .partition(|img| wanted.contains(img))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imgs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn split_without_keep_list_keeps_everything() {
        let existing = imgs(&["/uploads/projects/a.png", "/uploads/projects/b.png"]);
        let (keep, drop) = split_images(&existing, None);
        assert_eq!(keep, existing);
        assert!(drop.is_empty());
    }

    #[test]
    fn split_honours_keep_list() {
        let existing = imgs(&["/uploads/projects/a.png", "/uploads/projects/b.png"]);
        let (keep, drop) = split_images(&existing, Some(r#"["/uploads/projects/b.png"]"#));
        assert_eq!(keep, imgs(&["/uploads/projects/b.png"]));
        assert_eq!(drop, imgs(&["/uploads/projects/a.png"]));
    }

    #[test]
    fn split_ignores_foreign_entries() {
        let existing = imgs(&["/uploads/projects/a.png"]);
        let (keep, drop) = split_images(&existing, Some("/etc/passwd, /uploads/projects/a.png"));
        assert_eq!(keep, existing);
        assert!(drop.is_empty());
    }

    #[test]
    fn split_with_empty_keep_list_drops_all() {
        let existing = imgs(&["/uploads/projects/a.png"]);
        let (keep, drop) = split_images(&existing, Some("[]"));
        assert!(keep.is_empty());
        assert_eq!(drop, existing);
    }
}
