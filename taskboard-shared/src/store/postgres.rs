/// PostgreSQL-backed [`Store`]
///
/// A thin adapter: every method delegates to the model that owns the SQL and
/// converts `sqlx::Error` into [`StoreError`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreResult};
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
    token::BlacklistedToken,
    user::{CreateUser, User},
    ListOptions,
};
use crate::slug::Slug;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn user_by_slug(&self, slug: &Slug) -> StoreResult<Option<User>> {
        Ok(User::find_by_slug(&self.pool, slug).await?)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn blacklist_token(
        &self,
        jti: Uuid,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        Ok(BlacklistedToken::insert(&self.pool, jti, user_id, expires_at).await?)
    }

    async fn is_token_blacklisted(&self, jti: Uuid) -> StoreResult<bool> {
        Ok(BlacklistedToken::exists(&self.pool, jti).await?)
    }

    async fn purge_expired_tokens(&self) -> StoreResult<u64> {
        Ok(BlacklistedToken::purge_expired(&self.pool).await?)
    }

    async fn create_board(&self, data: CreateBoard) -> StoreResult<Board> {
        Ok(Board::create(&self.pool, data).await?)
    }

    async fn board_by_id(&self, id: i64) -> StoreResult<Option<Board>> {
        Ok(Board::find_by_id(&self.pool, id).await?)
    }

    async fn board_by_slug(&self, slug: &Slug) -> StoreResult<Option<Board>> {
        Ok(Board::find_by_slug(&self.pool, slug).await?)
    }

    async fn visible_boards(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<Board>> {
        Ok(Board::list_visible(&self.pool, user_id, options).await?)
    }

    async fn visible_board(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Board>> {
        Ok(Board::find_visible(&self.pool, user_id, slug).await?)
    }

    async fn update_board(&self, id: i64, data: UpdateBoard) -> StoreResult<Option<Board>> {
        Ok(Board::update(&self.pool, id, data).await?)
    }

    async fn delete_board(&self, id: i64) -> StoreResult<bool> {
        Ok(Board::delete(&self.pool, id).await?)
    }

    async fn create_list(&self, data: CreateList) -> StoreResult<List> {
        Ok(List::create(&self.pool, data).await?)
    }

    async fn list_by_id(&self, id: i64) -> StoreResult<Option<List>> {
        Ok(List::find_by_id(&self.pool, id).await?)
    }

    async fn list_by_slug(&self, slug: &Slug) -> StoreResult<Option<List>> {
        Ok(List::find_by_slug(&self.pool, slug).await?)
    }

    async fn visible_lists(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<List>> {
        Ok(List::list_visible(&self.pool, user_id, options).await?)
    }

    async fn visible_list(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<List>> {
        Ok(List::find_visible(&self.pool, user_id, slug).await?)
    }

    async fn update_list(&self, id: i64, data: UpdateList) -> StoreResult<Option<List>> {
        Ok(List::update(&self.pool, id, data).await?)
    }

    async fn delete_list(&self, id: i64) -> StoreResult<bool> {
        Ok(List::delete(&self.pool, id).await?)
    }

    async fn create_card(&self, data: CreateCard) -> StoreResult<Card> {
        Ok(Card::create(&self.pool, data).await?)
    }

    async fn card_by_id(&self, id: i64) -> StoreResult<Option<Card>> {
        Ok(Card::find_by_id(&self.pool, id).await?)
    }

    async fn card_by_slug(&self, slug: &Slug) -> StoreResult<Option<Card>> {
        Ok(Card::find_by_slug(&self.pool, slug).await?)
    }

    async fn visible_cards(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<Card>> {
        Ok(Card::list_visible(&self.pool, user_id, options).await?)
    }

    async fn visible_card(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Card>> {
        Ok(Card::find_visible(&self.pool, user_id, slug).await?)
    }

    async fn update_card(&self, id: i64, data: UpdateCard) -> StoreResult<Option<Card>> {
        Ok(Card::update(&self.pool, id, data).await?)
    }

    async fn delete_card(&self, id: i64) -> StoreResult<bool> {
        Ok(Card::delete(&self.pool, id).await?)
    }

    async fn create_comment(&self, data: CreateComment) -> StoreResult<Comment> {
        Ok(Comment::create(&self.pool, data).await?)
    }

    async fn visible_comments(
        &self,
        user_id: i64,
        options: &ListOptions,
    ) -> StoreResult<Vec<Comment>> {
        Ok(Comment::list_visible(&self.pool, user_id, options).await?)
    }

    async fn visible_comment(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Comment>> {
        Ok(Comment::find_visible(&self.pool, user_id, slug).await?)
    }

    async fn update_comment(&self, id: i64, data: UpdateComment) -> StoreResult<Option<Comment>> {
        Ok(Comment::update(&self.pool, id, data).await?)
    }

    async fn delete_comment(&self, id: i64) -> StoreResult<bool> {
        Ok(Comment::delete(&self.pool, id).await?)
    }

    async fn create_attachment(&self, data: CreateAttachment) -> StoreResult<Attachment> {
        Ok(Attachment::create(&self.pool, data).await?)
    }

    async fn visible_attachments(
        &self,
        user_id: i64,
        options: &ListOptions,
    ) -> StoreResult<Vec<Attachment>> {
        Ok(Attachment::list_visible(&self.pool, user_id, options).await?)
    }

    async fn visible_attachment(
        &self,
        user_id: i64,
        slug: &Slug,
    ) -> StoreResult<Option<Attachment>> {
        Ok(Attachment::find_visible(&self.pool, user_id, slug).await?)
    }

    async fn update_attachment(
        &self,
        id: i64,
        data: UpdateAttachment,
    ) -> StoreResult<Option<Attachment>> {
        Ok(Attachment::update(&self.pool, id, data).await?)
    }

    async fn delete_attachment(&self, id: i64) -> StoreResult<bool> {
        Ok(Attachment::delete(&self.pool, id).await?)
    }

    async fn attachment_blob_refs(&self, scope: AttachmentScope) -> StoreResult<Vec<String>> {
        Ok(Attachment::blob_refs(&self.pool, scope).await?)
    }

    async fn create_tag(&self, data: CreateTag) -> StoreResult<Tag> {
        Ok(Tag::create(&self.pool, data).await?)
    }

    async fn visible_tags(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<Tag>> {
        Ok(Tag::list_visible(&self.pool, user_id, options).await?)
    }

    async fn visible_tag(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Tag>> {
        Ok(Tag::find_visible(&self.pool, user_id, slug).await?)
    }

    async fn update_tag(&self, id: i64, data: UpdateTag) -> StoreResult<Option<Tag>> {
        Ok(Tag::update(&self.pool, id, data).await?)
    }

    async fn delete_tag(&self, id: i64) -> StoreResult<bool> {
        Ok(Tag::delete(&self.pool, id).await?)
    }

    async fn board_member(&self, board_id: i64, user_id: i64) -> StoreResult<Option<BoardMember>> {
        Ok(BoardMember::find(&self.pool, board_id, user_id).await?)
    }

    async fn board_members(&self, board_id: i64) -> StoreResult<Vec<MemberListing>> {
        Ok(BoardMember::list_for_board(&self.pool, board_id).await?)
    }

    async fn grant_board_member(
        &self,
        board_id: i64,
        user_id: i64,
        is_admin: bool,
    ) -> StoreResult<BoardMember> {
        Ok(BoardMember::grant(&self.pool, board_id, user_id, is_admin).await?)
    }

    async fn update_board_member(
        &self,
        board_id: i64,
        user_id: i64,
        data: UpdateBoardMember,
    ) -> StoreResult<MemberChange> {
        Ok(BoardMember::update(&self.pool, board_id, user_id, data).await?)
    }

    async fn count_board_admins(&self, board_id: i64) -> StoreResult<i64> {
        Ok(BoardMember::count_active_admins(&self.pool, board_id).await?)
    }

    async fn participant(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<Participant>> {
        Ok(Participant::find(&self.pool, kind, resource_id, user_id).await?)
    }

    async fn participants(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
    ) -> StoreResult<Vec<MemberListing>> {
        Ok(Participant::list_for(&self.pool, kind, resource_id).await?)
    }

    async fn grant_participant(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
    ) -> StoreResult<Participant> {
        Ok(Participant::grant(&self.pool, kind, resource_id, user_id).await?)
    }

    async fn set_participant_active(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
        is_active: bool,
    ) -> StoreResult<Option<Participant>> {
        Ok(Participant::set_active(&self.pool, kind, resource_id, user_id, is_active).await?)
    }
}
