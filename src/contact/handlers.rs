use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{self, Contact};
use crate::{
    auth::AdminPrincipal,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    pagination::PageQuery,
    state::AppState,
};

const DEFAULT_LIMIT: i64 = 20;
const SUBMITTED: &str = "Your message has been successfully submitted!";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactSubmitted {
    pub message: &'static str,
    pub submission: Contact,
}

#[derive(Debug, Serialize)]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", get(list_contacts).post(submit_contact))
        .route("/contact/:id", delete(delete_contact))
}

impl ContactRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if [&self.name, &self.email, &self.message]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(ApiError::validation("All fields are required."));
        }
        Ok(())
    }
}

#[instrument(skip(state, req))]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> ApiResult<(StatusCode, Json<ContactSubmitted>)> {
    req.validate()?;
    let submission = repo::create(
        &state.db,
        req.name.trim(),
        req.email.trim(),
        req.message.trim(),
    )
    .await?;
    info!(contact_id = %submission.id, "contact submitted");
    Ok((
        StatusCode::CREATED,
        Json(ContactSubmitted {
            message: SUBMITTED,
            submission,
        }),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
pub async fn list_contacts(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Query(q): Query<PageQuery>,
) -> ApiResult<Json<ContactPage>> {
    let page = q.resolve(DEFAULT_LIMIT);
    let (contacts, total) = repo::list(&state.db, page).await?;
    Ok(Json(ContactPage {
        contacts,
        total,
        page: page.page,
        limit: page.limit,
    }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
pub async fn delete_contact(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Contact submission not found"));
    }
    info!(contact_id = %id, "contact deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_every_field() {
        let ok = ContactRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            message: "hello".into(),
        };
        assert!(ok.validate().is_ok());

        let blank: ContactRequest =
            serde_json::from_str(r#"{"name":"Ada","email":"  ","message":"hi"}"#).unwrap();
        assert!(matches!(blank.validate(), Err(ApiError::Validation(_))));

        let missing: ContactRequest = serde_json::from_str(r#"{"name":"Ada"}"#).unwrap();
        assert!(missing.validate().is_err());
    }
}
