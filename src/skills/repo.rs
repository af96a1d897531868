use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::Page;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub level: Option<i32>,
    pub icon_path: Option<String>,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewSkill {
    pub name: String,
    pub level: Option<i32>,
    pub icon_path: Option<String>,
    pub category: String,
}

#[derive(Debug, Default)]
pub struct SkillChanges {
    pub name: Option<String>,
    pub level: Option<i32>,
    pub icon_path: Option<String>,
    pub category: Option<String>,
}

const COLUMNS: &str = "id, name, level, icon_path, category, created_at";

/// One page of skills, optionally limited to a category, plus the total
/// count under the same filter.
pub async fn list(db: &PgPool, category: Option<&str>, page: Page) -> anyhow::Result<(Vec<Skill>, i64)> {
    let rows = sqlx::query_as::<_, Skill>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM skills
        WHERE ($1::text IS NULL OR category = $1)
        ORDER BY name ASC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(category)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    let total: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM skills WHERE ($1::text IS NULL OR category = $1)"#)
            .bind(category)
            .fetch_one(db)
            .await?;

    Ok((rows, total))
}

pub async fn create(db: &PgPool, s: &NewSkill) -> anyhow::Result<Skill> {
    let row = sqlx::query_as::<_, Skill>(&format!(
        r#"
        INSERT INTO skills (name, level, icon_path, category)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&s.name)
    .bind(s.level)
    .bind(&s.icon_path)
    .bind(&s.category)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, c: &SkillChanges) -> anyhow::Result<Option<Skill>> {
    let row = sqlx::query_as::<_, Skill>(&format!(
        r#"
        UPDATE skills
           SET name = COALESCE($2, name),
               level = COALESCE($3, level),
               icon_path = COALESCE($4, icon_path),
               category = COALESCE($5, category)
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&c.name)
    .bind(c.level)
    .bind(&c.icon_path)
    .bind(&c.category)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Returns whether a row was deleted.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM skills WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
