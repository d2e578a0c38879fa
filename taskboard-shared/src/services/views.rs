/// Outward representations of resources
///
/// Views replace every internal id with the referenced row's slug: the
/// parent (`board`, `list`, `card`) and the creator or author. Slug lookups
/// are memoized per [`ViewBuilder`], so rendering a page of cards that share
/// one list costs one list lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    attachment::Attachment,
    board::Board,
    card::Card,
    comment::Comment,
    list::List,
    membership::MemberListing,
    tag::Tag,
    user::User,
};
use crate::slug::Slug;
use crate::store::Store;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub slug: Slug,
    pub email: String,
    pub first_name: String,
    pub sur_name: String,
    pub full_name: String,
    pub registered_at: DateTime<Utc>,
}

impl From<&User> for AccountView {
    fn from(user: &User) -> Self {
        Self {
            slug: user.slug.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            sur_name: user.sur_name.clone(),
            full_name: user.full_name(),
            registered_at: user.registered_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_by: Option<Slug>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListView {
    pub slug: Slug,
    pub board: Slug,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_by: Option<Slug>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardView {
    pub slug: Slug,
    pub list: Slug,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_by: Option<Slug>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub slug: Slug,
    pub card: Slug,
    pub author: Option<Slug>,
    pub body: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentView {
    pub slug: Slug,
    pub card: Slug,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub is_active: bool,
    pub created_by: Option<Slug>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagView {
    pub slug: Slug,
    pub card: Slug,
    pub label: String,
    pub is_active: bool,
    pub created_by: Option<Slug>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Board member or list/card participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberView {
    pub user: Slug,
    pub email: String,
    pub first_name: String,
    pub sur_name: String,
    pub is_active: bool,
    /// Present for board members only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    pub joined_at: DateTime<Utc>,
}

impl From<MemberListing> for MemberView {
    fn from(listing: MemberListing) -> Self {
        Self {
            user: listing.user_slug,
            email: listing.email,
            first_name: listing.first_name,
            sur_name: listing.sur_name,
            is_active: listing.is_active,
            is_admin: listing.is_admin,
            joined_at: listing.joined_at,
        }
    }
}

/// Renders views, memoizing id-to-slug lookups
pub struct ViewBuilder<'a> {
    store: &'a dyn Store,
    users: HashMap<i64, Option<Slug>>,
    boards: HashMap<i64, Slug>,
    lists: HashMap<i64, Slug>,
    cards: HashMap<i64, Slug>,
}

impl<'a> ViewBuilder<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            users: HashMap::new(),
            boards: HashMap::new(),
            lists: HashMap::new(),
            cards: HashMap::new(),
        }
    }

    async fn user_slug(&mut self, id: i64) -> ServiceResult<Option<Slug>> {
        if let Some(slug) = self.users.get(&id) {
            return Ok(slug.clone());
        }
        let slug = self.store.user_by_id(id).await?.map(|u| u.slug);
        self.users.insert(id, slug.clone());
        Ok(slug)
    }

    async fn board_slug(&mut self, id: i64) -> ServiceResult<Slug> {
        if let Some(slug) = self.boards.get(&id) {
            return Ok(slug.clone());
        }
        let slug = self
            .store
            .board_by_id(id)
            .await?
            .map(|b| b.slug)
            .ok_or_else(|| ServiceError::not_found("Board"))?;
        self.boards.insert(id, slug.clone());
        Ok(slug)
    }

    async fn list_slug(&mut self, id: i64) -> ServiceResult<Slug> {
        if let Some(slug) = self.lists.get(&id) {
            return Ok(slug.clone());
        }
        let slug = self
            .store
            .list_by_id(id)
            .await?
            .map(|l| l.slug)
            .ok_or_else(|| ServiceError::not_found("List"))?;
        self.lists.insert(id, slug.clone());
        Ok(slug)
    }

    async fn card_slug(&mut self, id: i64) -> ServiceResult<Slug> {
        if let Some(slug) = self.cards.get(&id) {
            return Ok(slug.clone());
        }
        let slug = self
            .store
            .card_by_id(id)
            .await?
            .map(|c| c.slug)
            .ok_or_else(|| ServiceError::not_found("Card"))?;
        self.cards.insert(id, slug.clone());
        Ok(slug)
    }

    pub async fn board(&mut self, board: Board) -> ServiceResult<BoardView> {
        Ok(BoardView {
            created_by: self.user_slug(board.created_by).await?,
            slug: board.slug,
            name: board.name,
            description: board.description,
            is_active: board.is_active,
            created_at: board.created_at,
            updated_at: board.updated_at,
        })
    }

    pub async fn list(&mut self, list: List) -> ServiceResult<ListView> {
        Ok(ListView {
            board: self.board_slug(list.board_id).await?,
            created_by: self.user_slug(list.created_by).await?,
            slug: list.slug,
            name: list.name,
            description: list.description,
            is_active: list.is_active,
            created_at: list.created_at,
            updated_at: list.updated_at,
        })
    }

    pub async fn card(&mut self, card: Card) -> ServiceResult<CardView> {
        Ok(CardView {
            list: self.list_slug(card.list_id).await?,
            created_by: self.user_slug(card.created_by).await?,
            slug: card.slug,
            name: card.name,
            description: card.description,
            is_active: card.is_active,
            created_at: card.created_at,
            updated_at: card.updated_at,
        })
    }

    pub async fn comment(&mut self, comment: Comment) -> ServiceResult<CommentView> {
        Ok(CommentView {
            card: self.card_slug(comment.card_id).await?,
            author: self.user_slug(comment.user_id).await?,
            slug: comment.slug,
            body: comment.body,
            is_active: comment.is_active,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        })
    }

    pub async fn attachment(&mut self, attachment: Attachment) -> ServiceResult<AttachmentView> {
        Ok(AttachmentView {
            card: self.card_slug(attachment.card_id).await?,
            created_by: self.user_slug(attachment.created_by).await?,
            slug: attachment.slug,
            file_name: attachment.file_name,
            content_type: attachment.content_type,
            size_bytes: attachment.size_bytes,
            is_active: attachment.is_active,
            created_at: attachment.created_at,
            updated_at: attachment.updated_at,
        })
    }

    pub async fn tag(&mut self, tag: Tag) -> ServiceResult<TagView> {
        Ok(TagView {
            card: self.card_slug(tag.card_id).await?,
            created_by: self.user_slug(tag.created_by).await?,
            slug: tag.slug,
            label: tag.label,
            is_active: tag.is_active,
            created_at: tag.created_at,
            updated_at: tag.updated_at,
        })
    }
}
