/// Card model and database operations
///
/// A card belongs to one list; its tenant is the list's board.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE cards (
///     id BIGSERIAL PRIMARY KEY,
///     slug VARCHAR(40) NOT NULL UNIQUE,
///     list_id BIGINT NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
///     name VARCHAR(50) NOT NULL,
///     description VARCHAR(500) NOT NULL DEFAULT '',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_by BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::ListOptions;
use crate::slug::{assign_slug, Slug, Sluggable};

const CARD_COLUMNS: &str = "c.id, c.slug, c.list_id, c.name, c.description, c.is_active, \
     c.created_by, c.created_at, c.updated_at";

/// Card row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Card {
    pub id: i64,
    pub slug: Slug,
    pub list_id: i64,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCard {
    pub slug: Option<Slug>,
    pub list_id: i64,
    pub name: String,
    pub description: String,
    pub created_by: i64,
}

impl Sluggable for CreateCard {
    fn slug_mut(&mut self) -> &mut Option<Slug> {
        &mut self.slug
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCard {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Card {
    /// Creates a card and its creator's participant row in one transaction
    pub async fn create(pool: &PgPool, mut data: CreateCard) -> Result<Self, sqlx::Error> {
        let slug = assign_slug(&mut data);
        let mut tx = pool.begin().await?;

        let card = sqlx::query_as::<_, Card>(&format!(
            "INSERT INTO cards AS c (slug, list_id, name, description, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(&slug)
        .bind(data.list_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO card_members (card_id, user_id, is_active) VALUES ($1, $2, TRUE)")
            .bind(card.id)
            .bind(data.created_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(card)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>(&format!("SELECT {CARD_COLUMNS} FROM cards c WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &Slug) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>(&format!("SELECT {CARD_COLUMNS} FROM cards c WHERE c.slug = $1"))
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Cards under boards where `user_id` is an active member, newest first
    ///
    /// `options.parent` narrows the result to one list (by list slug).
    pub async fn list_visible(
        pool: &PgPool,
        user_id: i64,
        options: &ListOptions,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c
             JOIN lists l ON l.id = c.list_id
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active
               AND ($2 OR c.is_active)
               AND ($3::VARCHAR IS NULL OR l.slug = $3)
             ORDER BY c.id DESC
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
        sqlx::query_as::<_, Card>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c
             JOIN lists l ON l.id = c.list_id
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active AND c.slug = $2"
        ))
        .bind(user_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateCard,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>(&format!(
            "UPDATE cards AS c SET
                 name = COALESCE($2, c.name),
                 description = COALESCE($3, c.description),
                 is_active = COALESCE($4, c.is_active),
                 updated_at = NOW()
             WHERE c.id = $1
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
