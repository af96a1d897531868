use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub id: Uuid,
    pub content: Option<String>,
    pub frontend_focus: Option<String>,
    pub performance: Option<String>,
    pub resume_path: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct AboutInput {
    pub content: Option<String>,
    pub frontend_focus: Option<String>,
    pub performance: Option<String>,
    pub resume_path: Option<String>,
}

const COLUMNS: &str = "id, content, frontend_focus, performance, resume_path, created_at, updated_at";

pub async fn find(db: &PgPool) -> anyhow::Result<Option<About>> {
    let row = sqlx::query_as::<_, About>(&format!(
        "SELECT {COLUMNS} FROM about ORDER BY created_at ASC LIMIT 1"
    ))
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Insert or update the single About row. Returns the saved row and the
/// resume path it replaced, if any.
pub async fn upsert(db: &PgPool, input: &AboutInput) -> anyhow::Result<(About, Option<String>)> {
    let mut tx = db.begin().await?;

    // make sure the row exists so the lock below has something to hold
    sqlx::query("INSERT INTO about DEFAULT VALUES ON CONFLICT (singleton) DO NOTHING")
        .execute(&mut *tx)
        .await?;

    let (id, old_resume) = sqlx::query_as::<_, (Uuid, Option<String>)>(
        r#"SELECT id, resume_path FROM about WHERE singleton FOR UPDATE"#,
    )
    .fetch_one(&mut *tx)
    .await?;

    let about = sqlx::query_as::<_, About>(&format!(
        r#"
        UPDATE about
           SET content = COALESCE($2, content),
               frontend_focus = COALESCE($3, frontend_focus),
               performance = COALESCE($4, performance),
               resume_path = COALESCE($5, resume_path),
               updated_at = now()
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.content)
    .bind(&input.frontend_focus)
    .bind(&input.performance)
    .bind(&input.resume_path)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let replaced = old_resume.filter(|old| input.resume_path.as_ref().is_some_and(|new| new != old));
    Ok((about, replaced))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn concurrent_first_upserts_share_one_row(db: PgPool) {
        let a = AboutInput {
            content: Some("Bio".into()),
            ..Default::default()
        };
        let b = AboutInput {
            resume_path: Some("/uploads/resumes/resume-1.pdf".into()),
            ..Default::default()
        };

        let (ra, rb) = tokio::join!(upsert(&db, &a), upsert(&db, &b));
        assert_eq!(ra.unwrap().0.id, rb.unwrap().0.id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM about")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn new_resume_reports_the_replaced_one(db: PgPool) {
        let first = AboutInput {
            resume_path: Some("/uploads/resumes/old.pdf".into()),
            ..Default::default()
        };
        let (_, replaced) = upsert(&db, &first).await.unwrap();
        assert_eq!(replaced, None);

        let second = AboutInput {
            resume_path: Some("/uploads/resumes/new.pdf".into()),
            ..Default::default()
        };
        let (about, replaced) = upsert(&db, &second).await.unwrap();
        assert_eq!(about.resume_path.as_deref(), Some("/uploads/resumes/new.pdf"));
        assert_eq!(replaced.as_deref(), Some("/uploads/resumes/old.pdf"));
    }
}
