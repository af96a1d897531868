use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Landing page hero. There is at most one row.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub id: Uuid,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub hero_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeInput {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub hero_image: Option<String>,
}

pub async fn find(db: &PgPool) -> anyhow::Result<Option<Home>> {
    let row = sqlx::query_as::<_, Home>(
        r#"
        SELECT id, title, subtitle, hero_image, created_at, updated_at
        FROM home
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Insert the row or merge into it. Absent fields keep their stored value.
pub async fn upsert(db: &PgPool, input: &HomeInput) -> anyhow::Result<Home> {
    let home = sqlx::query_as::<_, Home>(
        r#"
        INSERT INTO home (title, subtitle, hero_image)
        VALUES ($1, $2, $3)
        ON CONFLICT (singleton) DO UPDATE
           SET title = COALESCE(EXCLUDED.title, home.title),
               subtitle = COALESCE(EXCLUDED.subtitle, home.subtitle),
               hero_image = COALESCE(EXCLUDED.hero_image, home.hero_image),
               updated_at = now()
        RETURNING id, title, subtitle, hero_image, created_at, updated_at
        "#,
    )
    .bind(&input.title)
    .bind(&input.subtitle)
    .bind(&input.hero_image)
    .fetch_one(db)
    .await?;
    Ok(home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn concurrent_first_upserts_share_one_row(db: PgPool) {
        let a = HomeInput {
            title: Some("Hello".into()),
            ..Default::default()
        };
        let b = HomeInput {
            subtitle: Some("World".into()),
            ..Default::default()
        };

        let (ra, rb) = tokio::join!(upsert(&db, &a), upsert(&db, &b));
        assert_eq!(ra.unwrap().id, rb.unwrap().id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM home")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let home = find(&db).await.unwrap().unwrap();
        assert_eq!(home.title.as_deref(), Some("Hello"));
        assert_eq!(home.subtitle.as_deref(), Some("World"));
    }
}
