/// Card tag model
///
/// A label appears at most once per card (`UNIQUE (card_id, label)`).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::ListOptions;
use crate::slug::{assign_slug, Slug, Sluggable};

const TAG_COLUMNS: &str =
    "t.id, t.slug, t.card_id, t.label, t.is_active, t.created_by, t.created_at, t.updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub slug: Slug,
    pub card_id: i64,
    pub label: String,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTag {
    pub slug: Option<Slug>,
    pub card_id: i64,
    pub label: String,
    pub created_by: i64,
}

impl Sluggable for CreateTag {
    fn slug_mut(&mut self) -> &mut Option<Slug> {
        &mut self.slug
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTag {
    pub label: Option<String>,
    pub is_active: Option<bool>,
}

impl Tag {
    /// Creates a tag
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the card already carries `label`.
    pub async fn create(pool: &PgPool, mut data: CreateTag) -> Result<Self, sqlx::Error> {
        let slug = assign_slug(&mut data);

        sqlx::query_as::<_, Tag>(&format!(
            "INSERT INTO card_tags AS t (slug, card_id, label, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {TAG_COLUMNS}"
        ))
        .bind(&slug)
        .bind(data.card_id)
        .bind(&data.label)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn list_visible(
        pool: &PgPool,
        user_id: i64,
        options: &ListOptions,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(&format!(
            "SELECT {TAG_COLUMNS} FROM card_tags t
             JOIN cards c ON c.id = t.card_id
             JOIN lists l ON l.id = c.list_id
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active
               AND ($2 OR t.is_active)
               AND ($3::VARCHAR IS NULL OR c.slug = $3)
             ORDER BY t.id DESC
             LIMIT $4 OFFSET $5"
        ))
        .bind(user_id)
        .bind(options.include_inactive)
        .bind(options.parent_slug())
        .bind(options.limit())
        .bind(options.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn find_visible(
        pool: &PgPool,
        user_id: i64,
        slug: &Slug,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(&format!(
            "SELECT {TAG_COLUMNS} FROM card_tags t
             JOIN cards c ON c.id = t.card_id
             JOIN lists l ON l.id = c.list_id
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active AND t.slug = $2"
        ))
        .bind(user_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTag,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(&format!(
            "UPDATE card_tags AS t SET
                 label = COALESCE($2, t.label),
                 is_active = COALESCE($3, t.is_active),
                 updated_at = NOW()
             WHERE t.id = $1
             RETURNING {TAG_COLUMNS}"
        ))
        .bind(id)
        .bind(data.label)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM card_tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
