use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{self, NewSkill, Skill, SkillChanges};
use crate::{
    auth::AdminPrincipal,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    pagination::PageQuery,
    state::AppState,
};

const DEFAULT_LIMIT: i64 = 20;

// page fields are listed inline; flatten breaks numeric query parsing
#[derive(Debug, Deserialize)]
pub struct SkillQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SkillPage {
    pub skills: Vec<Skill>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Create/update body. `level` may arrive as a number or a numeric string.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkillBody {
    pub name: Option<String>,
    pub level: Option<Value>,
    pub icon_path: Option<String>,
    pub category: Option<String>,
}

pub fn skill_routes() -> Router<AppState> {
    Router::new()
        .route("/skills", get(list_skills).post(create_skill))
        .route("/skills/:id", put(update_skill).delete(delete_skill))
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn normalize_category(v: Option<String>) -> Option<String> {
    non_blank(v).map(|s| s.to_uppercase())
}

fn parse_level(v: Option<&Value>) -> Result<Option<i32>, ApiError> {
    let level = match v {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    match level {
        Some(l) if (0..=100).contains(&l) => Ok(Some(l as i32)),
        _ => Err(ApiError::validation("Level must be an integer between 0 and 100")),
    }
}

#[instrument(skip(state))]
pub async fn list_skills(
    State(state): State<AppState>,
    Query(q): Query<SkillQuery>,
) -> ApiResult<Json<SkillPage>> {
    let page = PageQuery {
        page: q.page,
        limit: q.limit,
    }
    .resolve(DEFAULT_LIMIT);
    let category = normalize_category(q.category);
    let (skills, total) = repo::list(&state.db, category.as_deref(), page).await?;
    Ok(Json(SkillPage {
        skills,
        total,
        page: page.page,
        limit: page.limit,
    }))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.user_id))]
pub async fn create_skill(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Json(body): Json<SkillBody>,
) -> ApiResult<(StatusCode, Json<Skill>)> {
    let level = parse_level(body.level.as_ref())?;
    let (Some(name), Some(category)) = (non_blank(body.name), normalize_category(body.category))
    else {
        return Err(ApiError::validation("Name and category are required"));
    };

    let skill = repo::create(
        &state.db,
        &NewSkill {
            name,
            level,
            icon_path: non_blank(body.icon_path),
            category,
        },
    )
    .await?;
    info!(skill_id = %skill.id, "skill created");
    Ok((StatusCode::CREATED, Json(skill)))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.user_id))]
pub async fn update_skill(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(id): Path<Uuid>,
    Json(body): Json<SkillBody>,
) -> ApiResult<Json<Skill>> {
    let changes = SkillChanges {
        level: parse_level(body.level.as_ref())?,
        name: non_blank(body.name),
        icon_path: non_blank(body.icon_path),
        category: normalize_category(body.category),
    };
    let skill = repo::update(&state.db, id, &changes)
        .await?
        .ok_or(ApiError::NotFound("Skill not found"))?;
    info!(skill_id = %id, "skill updated");
    Ok(Json(skill))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
pub async fn delete_skill(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Skill not found"));
    }
    info!(skill_id = %id, "skill deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn level_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_level(Some(&json!(80))).unwrap(), Some(80));
        assert_eq!(parse_level(Some(&json!("75"))).unwrap(), Some(75));
        assert_eq!(parse_level(Some(&json!(""))).unwrap(), None);
        assert_eq!(parse_level(Some(&Value::Null)).unwrap(), None);
        assert_eq!(parse_level(None).unwrap(), None);
    }

    #[test]
    fn level_rejects_out_of_range_and_garbage() {
        assert!(parse_level(Some(&json!(101))).is_err());
        assert!(parse_level(Some(&json!(-1))).is_err());
        assert!(parse_level(Some(&json!("high"))).is_err());
        assert!(parse_level(Some(&json!(7.5))).is_err());
    }

    #[test]
    fn category_is_uppercased() {
        assert_eq!(
            normalize_category(Some(" frontend ".into())).as_deref(),
            Some("FRONTEND")
        );
        assert_eq!(normalize_category(Some("  ".into())), None);
    }
}
