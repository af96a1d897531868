use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::pagination::Page;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    pub role: String,
    pub company: String,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date::option")]
    pub end_date: Option<Date>,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewExperience {
    pub role: String,
    pub company: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub description: Option<String>,
}

/// `end_date: Some(None)` clears the stored end date; `None` leaves it.
#[derive(Debug, Default)]
pub struct ExperienceChanges {
    pub role: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Option<Date>>,
    pub description: Option<String>,
}

const COLUMNS: &str = "id, role, company, start_date, end_date, description, created_at";

pub async fn list(db: &PgPool, page: Page) -> anyhow::Result<(Vec<Experience>, i64)> {
    let rows = sqlx::query_as::<_, Experience>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM experiences
        ORDER BY start_date DESC
        LIMIT $1 OFFSET $2
        "#
    ))
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM experiences")
        .fetch_one(db)
        .await?;

    Ok((rows, total))
}

pub async fn create(db: &PgPool, e: &NewExperience) -> anyhow::Result<Experience> {
    let row = sqlx::query_as::<_, Experience>(&format!(
        r#"
        INSERT INTO experiences (role, company, start_date, end_date, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&e.role)
    .bind(&e.company)
    .bind(e.start_date)
    .bind(e.end_date)
    .bind(&e.description)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, c: &ExperienceChanges) -> anyhow::Result<Option<Experience>> {
    let row = sqlx::query_as::<_, Experience>(&format!(
        r#"
        UPDATE experiences
           SET role = COALESCE($2, role),
               company = COALESCE($3, company),
               start_date = COALESCE($4, start_date),
               end_date = CASE WHEN $5 THEN $6 ELSE end_date END,
               description = COALESCE($7, description)
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&c.role)
    .bind(&c.company)
    .bind(c.start_date)
    .bind(c.end_date.is_some())
    .bind(c.end_date.flatten())
    .bind(&c.description)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM experiences WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
