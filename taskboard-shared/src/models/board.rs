/// Board model and database operations
///
/// A board is the root of a tenant's hierarchy. Access to everything beneath
/// it (lists, cards, card children) is derived from `board_members`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id BIGSERIAL PRIMARY KEY,
///     slug VARCHAR(40) NOT NULL UNIQUE,
///     name VARCHAR(50) NOT NULL,
///     description VARCHAR(500) NOT NULL DEFAULT '',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_by BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a board cascades to its lists, cards, card children and every
/// membership row beneath it.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::board::{Board, CreateBoard};
/// use taskboard_shared::models::ListOptions;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64) -> Result<(), sqlx::Error> {
/// let board = Board::create(&pool, CreateBoard {
///     slug: None,
///     name: "Sprint".to_string(),
///     description: String::new(),
///     created_by: user_id,
/// }).await?;
///
/// // The creator is now an active admin member and sees the board
/// let boards = Board::list_visible(&pool, user_id, &ListOptions::default()).await?;
/// assert!(boards.iter().any(|b| b.id == board.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::ListOptions;
use crate::slug::{assign_slug, Slug, Sluggable};

const BOARD_COLUMNS: &str =
    "b.id, b.slug, b.name, b.description, b.is_active, b.created_by, b.created_at, b.updated_at";

/// Board row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Board {
    pub id: i64,
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a board
#[derive(Debug, Clone)]
pub struct CreateBoard {
    /// Assigned at insert time when `None`
    pub slug: Option<Slug>,
    pub name: String,
    pub description: String,
    /// Creator, who becomes the first admin member
    pub created_by: i64,
}

impl Sluggable for CreateBoard {
    fn slug_mut(&mut self) -> &mut Option<Slug> {
        &mut self.slug
    }
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateBoard {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Board {
    /// Creates a board and seeds its creator as an active admin member
    ///
    /// Both rows are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the creator does not exist, the slug collides, or
    /// the database connection fails. Nothing is written in that case.
    pub async fn create(pool: &PgPool, mut data: CreateBoard) -> Result<Self, sqlx::Error> {
        let slug = assign_slug(&mut data);
        let mut tx = pool.begin().await?;

        let board = sqlx::query_as::<_, Board>(&format!(
            "INSERT INTO boards AS b (slug, name, description, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {BOARD_COLUMNS}"
        ))
        .bind(&slug)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO board_members (board_id, user_id, is_active, is_admin)
             VALUES ($1, $2, TRUE, TRUE)",
        )
        .bind(board.id)
        .bind(data.created_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(board)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!("SELECT {BOARD_COLUMNS} FROM boards b WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Looks a board up by slug without any membership filter
    pub async fn find_by_slug(pool: &PgPool, slug: &Slug) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards b WHERE b.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Boards where `user_id` holds an active membership, newest first
    pub async fn list_visible(
        pool: &PgPool,
        user_id: i64,
        options: &ListOptions,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards b
             JOIN board_members bm ON bm.board_id = b.id
             WHERE bm.user_id = $1 AND bm.is_active AND ($2 OR b.is_active)
             ORDER BY b.id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(user_id)
        .bind(options.include_inactive)
        .bind(options.limit())
        .bind(options.offset())
        .fetch_all(pool)
        .await
    }

    /// Finds a board by slug, only if `user_id` holds an active membership
    ///
    /// Inactive boards are still returned so their admins can reactivate them.
    pub async fn find_visible(
        pool: &PgPool,
        user_id: i64,
        slug: &Slug,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards b
             JOIN board_members bm ON bm.board_id = b.id
             WHERE bm.user_id = $1 AND bm.is_active AND b.slug = $2"
        ))
        .bind(user_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update and bumps `updated_at`
    ///
    /// Returns `None` if the board no longer exists.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateBoard,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!(
            "UPDATE boards AS b SET
                 name = COALESCE($2, b.name),
                 description = COALESCE($3, b.description),
                 is_active = COALESCE($4, b.is_active),
                 updated_at = NOW()
             WHERE b.id = $1
             RETURNING {BOARD_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a board and, through cascades, everything beneath it
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
