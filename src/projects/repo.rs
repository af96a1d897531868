use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub tech_stack: Vec<String>,
    pub repo_link: Option<String>,
    pub demo_link: Option<String>,
    pub featured: bool,
    pub images: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub tech_stack: Vec<String>,
    pub repo_link: Option<String>,
    pub demo_link: Option<String>,
    pub featured: bool,
    pub images: Vec<String>,
}

/// Update payload. `None` keeps the stored value; `images` is the full new
/// list.
#[derive(Debug)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub repo_link: Option<String>,
    pub demo_link: Option<String>,
    pub featured: Option<bool>,
    pub images: Vec<String>,
}

const COLUMNS: &str =
    "id, title, description, tech_stack, repo_link, demo_link, featured, images, created_at";

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, Project>(&format!(
        "SELECT {COLUMNS} FROM projects ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Project>> {
    let row = sqlx::query_as::<_, Project>(&format!("SELECT {COLUMNS} FROM projects WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn create(db: &PgPool, p: &NewProject) -> anyhow::Result<Project> {
    let row = sqlx::query_as::<_, Project>(&format!(
        r#"
        INSERT INTO projects (title, description, tech_stack, repo_link, demo_link, featured, images)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&p.title)
    .bind(&p.description)
    .bind(&p.tech_stack)
    .bind(&p.repo_link)
    .bind(&p.demo_link)
    .bind(p.featured)
    .bind(&p.images)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, c: &ProjectChanges) -> anyhow::Result<Option<Project>> {
    let row = sqlx::query_as::<_, Project>(&format!(
        r#"
        UPDATE projects
           SET title = COALESCE($2, title),
               description = COALESCE($3, description),
               tech_stack = COALESCE($4, tech_stack),
               repo_link = COALESCE($5, repo_link),
               demo_link = COALESCE($6, demo_link),
               featured = COALESCE($7, featured),
               images = $8
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&c.title)
    .bind(&c.description)
    .bind(&c.tech_stack)
    .bind(&c.repo_link)
    .bind(&c.demo_link)
    .bind(c.featured)
    .bind(&c.images)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Deletes the row and returns it so the caller can clean up its files.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Project>> {
    let row = sqlx::query_as::<_, Project>(&format!(
        "DELETE FROM projects WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}
