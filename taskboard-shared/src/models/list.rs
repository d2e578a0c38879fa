/// List model and database operations
///
/// A list belongs to exactly one board and inherits its tenant from it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lists (
///     id BIGSERIAL PRIMARY KEY,
///     slug VARCHAR(40) NOT NULL UNIQUE,
///     board_id BIGINT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
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

const LIST_COLUMNS: &str = "l.id, l.slug, l.board_id, l.name, l.description, l.is_active, \
     l.created_by, l.created_at, l.updated_at";

/// List row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct List {
    pub id: i64,
    pub slug: Slug,
    pub board_id: i64,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a list
#[derive(Debug, Clone)]
pub struct CreateList {
    pub slug: Option<Slug>,
    pub board_id: i64,
    pub name: String,
    pub description: String,
    /// Creator, who becomes the first list participant
    pub created_by: i64,
}

impl Sluggable for CreateList {
    fn slug_mut(&mut self) -> &mut Option<Slug> {
        &mut self.slug
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateList {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl List {
    /// Creates a list and its creator's participant row in one transaction
    pub async fn create(pool: &PgPool, mut data: CreateList) -> Result<Self, sqlx::Error> {
        let slug = assign_slug(&mut data);
        let mut tx = pool.begin().await?;

        let list = sqlx::query_as::<_, List>(&format!(
            "INSERT INTO lists AS l (slug, board_id, name, description, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {LIST_COLUMNS}"
        ))
        .bind(&slug)
        .bind(data.board_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO list_members (list_id, user_id, is_active) VALUES ($1, $2, TRUE)")
            .bind(list.id)
            .bind(data.created_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(list)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(&format!("SELECT {LIST_COLUMNS} FROM lists l WHERE l.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Looks a list up by slug without any membership filter
    pub async fn find_by_slug(pool: &PgPool, slug: &Slug) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(&format!("SELECT {LIST_COLUMNS} FROM lists l WHERE l.slug = $1"))
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Lists on boards where `user_id` is an active member, newest first
    ///
    /// `options.parent` narrows the result to one board (by board slug).
    pub async fn list_visible(
        pool: &PgPool,
        user_id: i64,
        options: &ListOptions,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists l
             JOIN boards b ON b.id = l.board_id
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active
               AND ($2 OR l.is_active)
               AND ($3::VARCHAR IS NULL OR b.slug = $3)
             ORDER BY l.id DESC
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

    /// Finds a list by slug within `user_id`'s visible set
    pub async fn find_visible(
        pool: &PgPool,
        user_id: i64,
        slug: &Slug,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists l
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active AND l.slug = $2"
        ))
        .bind(user_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateList,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(&format!(
            "UPDATE lists AS l SET
                 name = COALESCE($2, l.name),
                 description = COALESCE($3, l.description),
                 is_active = COALESCE($4, l.is_active),
                 updated_at = NOW()
             WHERE l.id = $1
             RETURNING {LIST_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a list together with its cards and their children
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lists WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
