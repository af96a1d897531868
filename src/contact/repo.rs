use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::Page;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn create(db: &PgPool, name: &str, email: &str, message: &str) -> anyhow::Result<Contact> {
    let row = sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts (name, email, message)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, message, created_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(message)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list(db: &PgPool, page: Page) -> anyhow::Result<(Vec<Contact>, i64)> {
    let rows = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, name, email, message, created_at
        FROM contacts
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
        .fetch_one(db)
        .await?;

    Ok((rows, total))
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM contacts WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
