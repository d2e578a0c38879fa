/// Card attachment model
///
/// Rows hold metadata only. The payload lives in the blob store and is
/// addressed by `blob_ref`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE card_attachments (
///     id BIGSERIAL PRIMARY KEY,
///     slug VARCHAR(40) NOT NULL UNIQUE,
///     card_id BIGINT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
///     blob_ref VARCHAR(512) NOT NULL,
///     file_name VARCHAR(255) NOT NULL,
///     content_type VARCHAR(255) NOT NULL,
///     size_bytes BIGINT NOT NULL,
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

const ATTACHMENT_COLUMNS: &str = "a.id, a.slug, a.card_id, a.blob_ref, a.file_name, \
     a.content_type, a.size_bytes, a.is_active, a.created_by, a.created_at, a.updated_at";

/// Subtree whose attachments are collected before a cascading delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentScope {
    Board(i64),
    List(i64),
    Card(i64),
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Attachment {
    pub id: i64,
    pub slug: Slug,
    pub card_id: i64,
    /// Blob store reference
    pub blob_ref: String,
    /// File name as uploaded
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAttachment {
    pub slug: Option<Slug>,
    pub card_id: i64,
    pub blob_ref: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_by: i64,
}

impl Sluggable for CreateAttachment {
    fn slug_mut(&mut self) -> &mut Option<Slug> {
        &mut self.slug
    }
}

/// Attachment metadata that may change after upload
#[derive(Debug, Clone, Default)]
pub struct UpdateAttachment {
    pub file_name: Option<String>,
    pub is_active: Option<bool>,
}

impl Attachment {
    pub async fn create(pool: &PgPool, mut data: CreateAttachment) -> Result<Self, sqlx::Error> {
        let slug = assign_slug(&mut data);

        sqlx::query_as::<_, Attachment>(&format!(
            "INSERT INTO card_attachments AS a
                 (slug, card_id, blob_ref, file_name, content_type, size_bytes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ATTACHMENT_COLUMNS}"
        ))
        .bind(&slug)
        .bind(data.card_id)
        .bind(&data.blob_ref)
        .bind(&data.file_name)
        .bind(&data.content_type)
        .bind(data.size_bytes)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn list_visible(
        pool: &PgPool,
        user_id: i64,
        options: &ListOptions,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM card_attachments a
             JOIN cards c ON c.id = a.card_id
             JOIN lists l ON l.id = c.list_id
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active
               AND ($2 OR a.is_active)
               AND ($3::VARCHAR IS NULL OR c.slug = $3)
             ORDER BY a.id DESC
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
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM card_attachments a
             JOIN cards c ON c.id = a.card_id
             JOIN lists l ON l.id = c.list_id
             JOIN board_members bm ON bm.board_id = l.board_id
             WHERE bm.user_id = $1 AND bm.is_active AND a.slug = $2"
        ))
        .bind(user_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateAttachment,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Attachment>(&format!(
            "UPDATE card_attachments AS a SET
                 file_name = COALESCE($2, a.file_name),
                 is_active = COALESCE($3, a.is_active),
                 updated_at = NOW()
             WHERE a.id = $1
             RETURNING {ATTACHMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(data.file_name)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM card_attachments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Blob references of every attachment under `scope`, active or not
    pub async fn blob_refs(pool: &PgPool, scope: AttachmentScope) -> Result<Vec<String>, sqlx::Error> {
        let (filter, id) = match scope {
            AttachmentScope::Board(id) => ("l.board_id = $1", id),
            AttachmentScope::List(id) => ("c.list_id = $1", id),
            AttachmentScope::Card(id) => ("a.card_id = $1", id),
        };

        sqlx::query_scalar::<_, String>(&format!(
            "SELECT a.blob_ref FROM card_attachments a
             JOIN cards c ON c.id = a.card_id
             JOIN lists l ON l.id = c.list_id
             WHERE {filter}
             ORDER BY a.id"
        ))
        .bind(id)
        .fetch_all(pool)
        .await
    }
}
