/// Card comment model
///
/// The author (`user_id`) is the creator reference. Comments carry no
/// membership row of their own; visibility comes from the card's board.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::ListOptions;
use crate::slug::{assign_slug, Slug, Sluggable};

const COMMENT_COLUMNS: &str =
    "cm.id, cm.slug, cm.card_id, cm.user_id, cm.body, cm.is_active, cm.created_at, cm.updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub slug: Slug,
    pub card_id: i64,
    /// Author
    pub user_id: i64,
    pub body: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub slug: Option<Slug>,
    pub card_id: i64,
    pub user_id: i64,
    pub body: String,
}

impl Sluggable for CreateComment {
    fn slug_mut(&mut self) -> &mut Option<Slug> {
        &mut self.slug
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateComment {
    pub body: Option<String>,
    pub is_active: Option<bool>,
}

impl Comment {
    pub async fn create(pool: &PgPool, mut data: CreateComment) -> Result<Self, sqlx::Error> {
        let slug = assign_slug(&mut data);

        sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO card_comments AS cm (slug, card_id, user_id, body)
             VALUES ($1, $2, $3, $4)
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(&slug)
        .bind(data.card_id)
        .bind(data.user_id)
        .bind(&data.body)
        .fetch_one(pool)
        .await
    }

    /// Comments on cards visible to `user_id`, newest first
    ///
    /// `options.parent` narrows the result to one card (by card slug).
    pub async fn list_visible(
        pool: &PgPool,
        user_id: i64,
        options: &ListOptions,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM card_comments cm
             JOIN cards c ON c.id = cm.card_id
             JOIN lists l ON l.id = c.list_id
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active
               AND ($2 OR cm.is_active)
               AND ($3::VARCHAR IS NULL OR c.slug = $3)
             ORDER BY cm.id DESC
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
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM card_comments cm
             JOIN cards c ON c.id = cm.card_id
             JOIN lists l ON l.id = c.list_id
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active AND cm.slug = $2"
        ))
        .bind(user_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateComment,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            "UPDATE card_comments AS cm SET
                 body = COALESCE($2, cm.body),
                 is_active = COALESCE($3, cm.is_active),
                 updated_at = NOW()
             WHERE cm.id = $1
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(data.body)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM card_comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
