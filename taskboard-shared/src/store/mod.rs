/// Persistence seam
///
/// Services talk to storage only through the [`Store`] trait. Two
/// implementations exist:
///
/// - [`postgres::PgStore`]: the production store, delegating to the models
/// - [`memory::MemoryStore`]: an in-process store with the same contract,
///   used by tests and local experiments
///
/// Both enforce the same constraints: unique slugs, case-insensitive unique
/// emails, one tag label per card, one membership row per (resource, user),
/// cascading deletes, and atomic creation of an entity with its creator's
/// membership row.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_shared::store::{memory::MemoryStore, SharedStore};
///
/// let store: SharedStore = Arc::new(MemoryStore::new());
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    attachment::{Attachment, AttachmentScope, CreateAttachment, UpdateAttachment},
    board::{Board, CreateBoard, UpdateBoard},
    card::{Card, CreateCard, UpdateCard},
    comment::{Comment, CreateComment, UpdateComment},
    list::{CreateList, List, UpdateList},
    membership::{
        BoardMember, MemberChange, MemberListing, Participant, ParticipantKind, UpdateBoardMember,
    },
    tag::{CreateTag, Tag, UpdateTag},
    user::{CreateUser, User},
    ListOptions,
};
use crate::slug::Slug;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constraint name
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// A referenced parent row disappeared before the write landed
    #[error("Referenced row does not exist: {0}")]
    MissingReference(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Conflict(constraint);
            }
            if db_err.is_foreign_key_violation() {
                let constraint = db_err.constraint().unwrap_or("foreign key").to_string();
                return StoreError::MissingReference(constraint);
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle used by services and the HTTP layer
pub type SharedStore = Arc<dyn Store>;

/// Storage contract for the task board
///
/// Methods named `visible_*` filter by the caller's active board memberships;
/// `*_by_id` and `*_by_slug` do not, and are reserved for ownership walks,
/// authority checks and global parent resolution.
#[async_trait]
pub trait Store: Send + Sync {
    // Users

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;
    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn user_by_slug(&self, slug: &Slug) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    // Refresh-token blacklist

    async fn blacklist_token(
        &self,
        jti: Uuid,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;
    async fn is_token_blacklisted(&self, jti: Uuid) -> StoreResult<bool>;
    async fn purge_expired_tokens(&self) -> StoreResult<u64>;

    // Boards

    /// Persists the board and its creator's active admin membership atomically
    async fn create_board(&self, data: CreateBoard) -> StoreResult<Board>;
    async fn board_by_id(&self, id: i64) -> StoreResult<Option<Board>>;
    async fn board_by_slug(&self, slug: &Slug) -> StoreResult<Option<Board>>;
    async fn visible_boards(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<Board>>;
    async fn visible_board(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Board>>;
    async fn update_board(&self, id: i64, data: UpdateBoard) -> StoreResult<Option<Board>>;
    async fn delete_board(&self, id: i64) -> StoreResult<bool>;

    // Lists

    /// Persists the list and its creator's participant row atomically
    async fn create_list(&self, data: CreateList) -> StoreResult<List>;
    async fn list_by_id(&self, id: i64) -> StoreResult<Option<List>>;
    async fn list_by_slug(&self, slug: &Slug) -> StoreResult<Option<List>>;
    async fn visible_lists(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<List>>;
    async fn visible_list(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<List>>;
    async fn update_list(&self, id: i64, data: UpdateList) -> StoreResult<Option<List>>;
    async fn delete_list(&self, id: i64) -> StoreResult<bool>;

    // Cards

    /// Persists the card and its creator's participant row atomically
    async fn create_card(&self, data: CreateCard) -> StoreResult<Card>;
    async fn card_by_id(&self, id: i64) -> StoreResult<Option<Card>>;
    async fn card_by_slug(&self, slug: &Slug) -> StoreResult<Option<Card>>;
    async fn visible_cards(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<Card>>;
    async fn visible_card(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Card>>;
    async fn update_card(&self, id: i64, data: UpdateCard) -> StoreResult<Option<Card>>;
    async fn delete_card(&self, id: i64) -> StoreResult<bool>;

    // Comments

    async fn create_comment(&self, data: CreateComment) -> StoreResult<Comment>;
    async fn visible_comments(
        &self,
        user_id: i64,
        options: &ListOptions,
    ) -> StoreResult<Vec<Comment>>;
    async fn visible_comment(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Comment>>;
    async fn update_comment(&self, id: i64, data: UpdateComment) -> StoreResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> StoreResult<bool>;

    // Attachments

    async fn create_attachment(&self, data: CreateAttachment) -> StoreResult<Attachment>;
    async fn visible_attachments(
        &self,
        user_id: i64,
        options: &ListOptions,
    ) -> StoreResult<Vec<Attachment>>;
    async fn visible_attachment(
        &self,
        user_id: i64,
        slug: &Slug,
    ) -> StoreResult<Option<Attachment>>;
    async fn update_attachment(
        &self,
        id: i64,
        data: UpdateAttachment,
    ) -> StoreResult<Option<Attachment>>;
    async fn delete_attachment(&self, id: i64) -> StoreResult<bool>;
    /// Blob references under a subtree, collected before it is deleted
    async fn attachment_blob_refs(&self, scope: AttachmentScope) -> StoreResult<Vec<String>>;

    // Tags

    async fn create_tag(&self, data: CreateTag) -> StoreResult<Tag>;
    async fn visible_tags(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<Tag>>;
    async fn visible_tag(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Tag>>;
    async fn update_tag(&self, id: i64, data: UpdateTag) -> StoreResult<Option<Tag>>;
    async fn delete_tag(&self, id: i64) -> StoreResult<bool>;

    // Board membership

    async fn board_member(&self, board_id: i64, user_id: i64) -> StoreResult<Option<BoardMember>>;
    async fn board_members(&self, board_id: i64) -> StoreResult<Vec<MemberListing>>;
    /// Inserts an active membership or reactivates an existing one; never
    /// lowers an existing admin flag
    async fn grant_board_member(
        &self,
        board_id: i64,
        user_id: i64,
        is_admin: bool,
    ) -> StoreResult<BoardMember>;
    /// Applies the change unless it would leave the board without an active
    /// admin; the check and the write are atomic
    async fn update_board_member(
        &self,
        board_id: i64,
        user_id: i64,
        data: UpdateBoardMember,
    ) -> StoreResult<MemberChange>;
    async fn count_board_admins(&self, board_id: i64) -> StoreResult<i64>;

    // List and card participants

    async fn participant(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<Participant>>;
    async fn participants(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
    ) -> StoreResult<Vec<MemberListing>>;
    async fn grant_participant(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
    ) -> StoreResult<Participant>;
    async fn set_participant_active(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
        is_active: bool,
    ) -> StoreResult<Option<Participant>>;
}
