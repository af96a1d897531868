use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{self, Experience, ExperienceChanges, NewExperience};
use crate::{
    auth::AdminPrincipal,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    pagination::PageQuery,
    state::AppState,
};

const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Serialize)]
pub struct ExperiencePage {
    pub experiences: Vec<Experience>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExperienceBody {
    pub role: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<String>,
    /// Outer `None`: field absent. `Some(None)`: explicit null.
    #[serde(deserialize_with = "present")]
    pub end_date: Option<Option<String>>,
    pub description: Option<String>,
}

fn present<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(Some)
}

pub fn experience_routes() -> Router<AppState> {
    Router::new()
        .route("/experience", get(list_experience).post(create_experience))
        .route("/experience/journey", get(list_experience))
        .route("/experience/:id", put(update_experience).delete(delete_experience))
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_date(raw: &str) -> Result<Date, ApiError> {
    let raw = raw.trim();
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339).map(|dt| dt.date()))
        .map_err(|_| ApiError::validation(format!("Invalid date {raw:?}")))
}

/// Blank or null clears the date.
fn parse_end_date(raw: Option<String>) -> Result<Option<Date>, ApiError> {
    non_blank(raw).as_deref().map(parse_date).transpose()
}

#[instrument(skip(state))]
pub async fn list_experience(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<Json<ExperiencePage>> {
    let page = q.resolve(DEFAULT_LIMIT);
    let (experiences, total) = repo::list(&state.db, page).await?;
    Ok(Json(ExperiencePage {
        experiences,
        total,
        page: page.page,
        limit: page.limit,
    }))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.user_id))]
pub async fn create_experience(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Json(body): Json<ExperienceBody>,
) -> ApiResult<(StatusCode, Json<Experience>)> {
    let (Some(role), Some(company), Some(start)) = (
        non_blank(body.role),
        non_blank(body.company),
        non_blank(body.start_date),
    ) else {
        return Err(ApiError::validation(
            "Missing required fields: company, role, and startDate.",
        ));
    };

    let new = NewExperience {
        role,
        company,
        start_date: parse_date(&start)?,
        end_date: parse_end_date(body.end_date.flatten())?,
        description: non_blank(body.description),
    };
    let exp = repo::create(&state.db, &new).await?;
    info!(experience_id = %exp.id, "experience created");
    Ok((StatusCode::CREATED, Json(exp)))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.user_id))]
pub async fn update_experience(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(id): Path<Uuid>,
    Json(body): Json<ExperienceBody>,
) -> ApiResult<Json<Experience>> {
    let changes = ExperienceChanges {
        role: non_blank(body.role),
        company: non_blank(body.company),
        start_date: non_blank(body.start_date).as_deref().map(parse_date).transpose()?,
        end_date: body.end_date.map(parse_end_date).transpose()?,
        description: body.description,
    };
    let exp = repo::update(&state.db, id, &changes)
        .await?
        .ok_or(ApiError::NotFound("Experience entry not found"))?;
    info!(experience_id = %id, "experience updated");
    Ok(Json(exp))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
pub async fn delete_experience(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Experience entry not found"));
    }
    info!(experience_id = %id, "experience deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_plain_and_rfc3339_dates() {
        assert_eq!(parse_date("2023-04-01").unwrap(), date!(2023 - 04 - 01));
        assert_eq!(
            parse_date("2023-04-01T10:00:00Z").unwrap(),
            date!(2023 - 04 - 01)
        );
        assert!(parse_date("April 2023").is_err());
    }

    #[test]
    fn end_date_tri_state() {
        let absent: ExperienceBody = serde_json::from_str(r#"{"role":"Dev"}"#).unwrap();
        assert_eq!(absent.end_date, None);

        let null: ExperienceBody = serde_json::from_str(r#"{"endDate":null}"#).unwrap();
        assert_eq!(null.end_date, Some(None));

        let set: ExperienceBody = serde_json::from_str(r#"{"endDate":"2024-01-31"}"#).unwrap();
        assert_eq!(set.end_date, Some(Some("2024-01-31".to_string())));
    }

    #[test]
    fn blank_end_date_clears() {
        assert_eq!(parse_end_date(Some("".into())).unwrap(), None);
        assert_eq!(parse_end_date(None).unwrap(), None);
        assert_eq!(
            parse_end_date(Some("2024-01-31".into())).unwrap(),
            Some(date!(2024 - 01 - 31))
        );
    }

    #[test]
    fn experience_serializes_iso_dates() {
        let exp = Experience {
            id: Uuid::nil(),
            role: "Engineer".into(),
            company: "Acme".into(),
            start_date: date!(2021 - 03 - 15),
            end_date: None,
            description: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&exp).unwrap();
        assert_eq!(json["startDate"], "2021-03-15");
        assert!(json["endDate"].is_null());
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
    }
}
