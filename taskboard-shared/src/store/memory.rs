/// In-memory [`Store`]
///
/// Keeps every table in ordered maps behind a single `tokio::sync::RwLock`.
/// Writes take the lock exclusively, so multi-row creates are atomic. The
/// constraints of the PostgreSQL schema are reproduced here: unique slugs,
/// unique emails (ignoring case), unique tag labels per card, one membership
/// row per (resource, user), foreign keys and cascading deletes. Conflicts
/// report the same constraint names PostgreSQL would.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
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
use crate::slug::{assign_slug, Slug};

/// Rows addressable by slug
trait Row {
    fn id(&self) -> i64;
    fn slug(&self) -> &Slug;
    fn is_active(&self) -> bool;
}

macro_rules! impl_row {
    ($($ty:ty),*) => {
        $(impl Row for $ty {
            fn id(&self) -> i64 {
                self.id
            }
            fn slug(&self) -> &Slug {
                &self.slug
            }
            fn is_active(&self) -> bool {
                self.is_active
            }
        })*
    };
}

impl_row!(User, Board, List, Card, Comment, Attachment, Tag);

fn find_by_slug<'a, T: Row>(rows: &'a BTreeMap<i64, T>, slug: &Slug) -> Option<&'a T> {
    rows.values().find(|row| row.slug() == slug)
}

fn ensure_unique_slug<T: Row>(
    rows: &BTreeMap<i64, T>,
    slug: &Slug,
    constraint: &str,
) -> StoreResult<()> {
    if find_by_slug(rows, slug).is_some() {
        return Err(StoreError::Conflict(constraint.to_string()));
    }
    Ok(())
}

fn missing(constraint: &str) -> StoreError {
    StoreError::MissingReference(constraint.to_string())
}

/// Newest first, then offset and limit
fn page<'a, T: Row + Clone + 'a>(
    rows: impl Iterator<Item = &'a T>,
    options: &ListOptions,
) -> Vec<T> {
    let mut rows: Vec<&T> = rows
        .filter(|row| options.include_inactive || row.is_active())
        .collect();
    rows.sort_by_key(|row| std::cmp::Reverse(row.id()));
    rows.into_iter()
        .skip(options.offset() as usize)
        .take(options.limit() as usize)
        .cloned()
        .collect()
}

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, User>,
    boards: BTreeMap<i64, Board>,
    lists: BTreeMap<i64, List>,
    cards: BTreeMap<i64, Card>,
    comments: BTreeMap<i64, Comment>,
    attachments: BTreeMap<i64, Attachment>,
    tags: BTreeMap<i64, Tag>,
    board_members: BTreeMap<(i64, i64), BoardMember>,
    list_members: BTreeMap<(i64, i64), Participant>,
    card_members: BTreeMap<(i64, i64), Participant>,
    blacklist: HashMap<Uuid, (i64, DateTime<Utc>)>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn is_member(&self, board_id: i64, user_id: i64) -> bool {
        self.board_members
            .get(&(board_id, user_id))
            .map(|m| m.is_active)
            .unwrap_or(false)
    }

    fn board_of_list(&self, list_id: i64) -> Option<i64> {
        self.lists.get(&list_id).map(|l| l.board_id)
    }

    fn board_of_card(&self, card_id: i64) -> Option<i64> {
        self.cards
            .get(&card_id)
            .and_then(|c| self.board_of_list(c.list_id))
    }

    fn card_visible(&self, card_id: i64, user_id: i64) -> bool {
        self.board_of_card(card_id)
            .map(|board_id| self.is_member(board_id, user_id))
            .unwrap_or(false)
    }

    /// Resolves the `parent` filter to an id. `Err(())` means the parent slug
    /// matches nothing, so the listing is empty.
    fn parent_id<T: Row>(rows: &BTreeMap<i64, T>, options: &ListOptions) -> Result<Option<i64>, ()> {
        match &options.parent {
            Some(slug) => find_by_slug(rows, slug).map(|row| Some(row.id())).ok_or(()),
            None => Ok(None),
        }
    }

    fn participants_mut(&mut self, kind: ParticipantKind) -> &mut BTreeMap<(i64, i64), Participant> {
        match kind {
            ParticipantKind::List => &mut self.list_members,
            ParticipantKind::Card => &mut self.card_members,
        }
    }

    fn participants(&self, kind: ParticipantKind) -> &BTreeMap<(i64, i64), Participant> {
        match kind {
            ParticipantKind::List => &self.list_members,
            ParticipantKind::Card => &self.card_members,
        }
    }

    fn listing(&self, user_id: i64, is_active: bool, is_admin: Option<bool>, joined_at: DateTime<Utc>) -> Option<MemberListing> {
        self.users.get(&user_id).map(|u| MemberListing {
            user_slug: u.slug.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            sur_name: u.sur_name.clone(),
            is_active,
            is_admin,
            joined_at,
        })
    }

    fn remove_card(&mut self, card_id: i64) -> bool {
        let removed = self.cards.remove(&card_id).is_some();
        self.comments.retain(|_, c| c.card_id != card_id);
        self.attachments.retain(|_, a| a.card_id != card_id);
        self.tags.retain(|_, t| t.card_id != card_id);
        self.card_members.retain(|(id, _), _| *id != card_id);
        removed
    }

    fn remove_list(&mut self, list_id: i64) -> bool {
        let removed = self.lists.remove(&list_id).is_some();
        let cards: Vec<i64> = self
            .cards
            .values()
            .filter(|c| c.list_id == list_id)
            .map(|c| c.id)
            .collect();
        for card_id in cards {
            self.remove_card(card_id);
        }
        self.list_members.retain(|(id, _), _| *id != list_id);
        removed
    }

    fn remove_board(&mut self, board_id: i64) -> bool {
        let removed = self.boards.remove(&board_id).is_some();
        let lists: Vec<i64> = self
            .lists
            .values()
            .filter(|l| l.board_id == board_id)
            .map(|l| l.id)
            .collect();
        for list_id in lists {
            self.remove_list(list_id);
        }
        self.board_members.retain(|(id, _), _| *id != board_id);
        removed
    }
}

/// In-process store with the same contract as the PostgreSQL store
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, mut data: CreateUser) -> StoreResult<User> {
        let slug = assign_slug(&mut data);
        let mut t = self.tables.write().await;

        ensure_unique_slug(&t.users, &slug, "users_slug_key")?;
        let email = data.email.to_lowercase();
        if t.users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::Conflict("users_email_lower_key".to_string()));
        }

        let user = User {
            id: t.next_id(),
            slug,
            email: data.email,
            password_hash: data.password_hash,
            first_name: data.first_name,
            sur_name: data.sur_name,
            is_active: true,
            is_staff: false,
            registered_at: Utc::now(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_slug(&self, slug: &Slug) -> StoreResult<Option<User>> {
        Ok(find_by_slug(&self.tables.read().await.users, slug).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        let t = self.tables.read().await;
        Ok(t.users
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn blacklist_token(
        &self,
        jti: Uuid,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user_id) {
            return Err(missing("token_blacklist_user_id_fkey"));
        }
        t.blacklist.entry(jti).or_insert((user_id, expires_at));
        Ok(())
    }

    async fn is_token_blacklisted(&self, jti: Uuid) -> StoreResult<bool> {
        Ok(self.tables.read().await.blacklist.contains_key(&jti))
    }

    async fn purge_expired_tokens(&self) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let before = t.blacklist.len();
        t.blacklist.retain(|_, (_, expires_at)| *expires_at >= now);
        Ok((before - t.blacklist.len()) as u64)
    }

    async fn create_board(&self, mut data: CreateBoard) -> StoreResult<Board> {
        let slug = assign_slug(&mut data);
        let mut t = self.tables.write().await;

        ensure_unique_slug(&t.boards, &slug, "boards_slug_key")?;
        if !t.users.contains_key(&data.created_by) {
            return Err(missing("boards_created_by_fkey"));
        }

        let now = Utc::now();
        let board = Board {
            id: t.next_id(),
            slug,
            name: data.name,
            description: data.description,
            is_active: true,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        let member = BoardMember {
            id: t.next_id(),
            board_id: board.id,
            user_id: data.created_by,
            is_active: true,
            is_admin: true,
            joined_at: now,
        };
        t.board_members.insert((board.id, data.created_by), member);
        t.boards.insert(board.id, board.clone());
        Ok(board)
    }

    async fn board_by_id(&self, id: i64) -> StoreResult<Option<Board>> {
        Ok(self.tables.read().await.boards.get(&id).cloned())
    }

    async fn board_by_slug(&self, slug: &Slug) -> StoreResult<Option<Board>> {
        Ok(find_by_slug(&self.tables.read().await.boards, slug).cloned())
    }

    async fn visible_boards(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<Board>> {
        let t = self.tables.read().await;
        Ok(page(
            t.boards.values().filter(|b| t.is_member(b.id, user_id)),
            options,
        ))
    }

    async fn visible_board(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Board>> {
        let t = self.tables.read().await;
        Ok(find_by_slug(&t.boards, slug)
            .filter(|b| t.is_member(b.id, user_id))
            .cloned())
    }

    async fn update_board(&self, id: i64, data: UpdateBoard) -> StoreResult<Option<Board>> {
        let mut t = self.tables.write().await;
        Ok(t.boards.get_mut(&id).map(|board| {
            if let Some(name) = data.name {
                board.name = name;
            }
            if let Some(description) = data.description {
                board.description = description;
            }
            if let Some(is_active) = data.is_active {
                board.is_active = is_active;
            }
            board.updated_at = Utc::now();
            board.clone()
        }))
    }

    async fn delete_board(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.remove_board(id))
    }

    async fn create_list(&self, mut data: CreateList) -> StoreResult<List> {
        let slug = assign_slug(&mut data);
        let mut t = self.tables.write().await;

        ensure_unique_slug(&t.lists, &slug, "lists_slug_key")?;
        if !t.boards.contains_key(&data.board_id) {
            return Err(missing("lists_board_id_fkey"));
        }

        let now = Utc::now();
        let list = List {
            id: t.next_id(),
            slug,
            board_id: data.board_id,
            name: data.name,
            description: data.description,
            is_active: true,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        let participant = Participant {
            id: t.next_id(),
            resource_id: list.id,
            user_id: data.created_by,
            is_active: true,
            joined_at: now,
        };
        t.list_members.insert((list.id, data.created_by), participant);
        t.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn list_by_id(&self, id: i64) -> StoreResult<Option<List>> {
        Ok(self.tables.read().await.lists.get(&id).cloned())
    }

    async fn list_by_slug(&self, slug: &Slug) -> StoreResult<Option<List>> {
        Ok(find_by_slug(&self.tables.read().await.lists, slug).cloned())
    }

    async fn visible_lists(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<List>> {
        let t = self.tables.read().await;
        let Ok(board_id) = Tables::parent_id(&t.boards, options) else {
            return Ok(Vec::new());
        };
        Ok(page(
            t.lists.values().filter(|l| {
                board_id.map_or(true, |id| l.board_id == id) && t.is_member(l.board_id, user_id)
            }),
            options,
        ))
    }

    async fn visible_list(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<List>> {
        let t = self.tables.read().await;
        Ok(find_by_slug(&t.lists, slug)
            .filter(|l| t.is_member(l.board_id, user_id))
            .cloned())
    }

    async fn update_list(&self, id: i64, data: UpdateList) -> StoreResult<Option<List>> {
        let mut t = self.tables.write().await;
        Ok(t.lists.get_mut(&id).map(|list| {
            if let Some(name) = data.name {
                list.name = name;
            }
            if let Some(description) = data.description {
                list.description = description;
            }
            if let Some(is_active) = data.is_active {
                list.is_active = is_active;
            }
            list.updated_at = Utc::now();
            list.clone()
        }))
    }

    async fn delete_list(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.remove_list(id))
    }

    async fn create_card(&self, mut data: CreateCard) -> StoreResult<Card> {
        let slug = assign_slug(&mut data);
        let mut t = self.tables.write().await;

        ensure_unique_slug(&t.cards, &slug, "cards_slug_key")?;
        if !t.lists.contains_key(&data.list_id) {
            return Err(missing("cards_list_id_fkey"));
        }

        let now = Utc::now();
        let card = Card {
            id: t.next_id(),
            slug,
            list_id: data.list_id,
            name: data.name,
            description: data.description,
            is_active: true,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        let participant = Participant {
            id: t.next_id(),
            resource_id: card.id,
            user_id: data.created_by,
            is_active: true,
            joined_at: now,
        };
        t.card_members.insert((card.id, data.created_by), participant);
        t.cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn card_by_id(&self, id: i64) -> StoreResult<Option<Card>> {
        Ok(self.tables.read().await.cards.get(&id).cloned())
    }

    async fn card_by_slug(&self, slug: &Slug) -> StoreResult<Option<Card>> {
        Ok(find_by_slug(&self.tables.read().await.cards, slug).cloned())
    }

    async fn visible_cards(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<Card>> {
        let t = self.tables.read().await;
        let Ok(list_id) = Tables::parent_id(&t.lists, options) else {
            return Ok(Vec::new());
        };
        Ok(page(
            t.cards.values().filter(|c| {
                list_id.map_or(true, |id| c.list_id == id) && t.card_visible(c.id, user_id)
            }),
            options,
        ))
    }

    async fn visible_card(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Card>> {
        let t = self.tables.read().await;
        Ok(find_by_slug(&t.cards, slug)
            .filter(|c| t.card_visible(c.id, user_id))
            .cloned())
    }

    async fn update_card(&self, id: i64, data: UpdateCard) -> StoreResult<Option<Card>> {
        let mut t = self.tables.write().await;
        Ok(t.cards.get_mut(&id).map(|card| {
            if let Some(name) = data.name {
                card.name = name;
            }
            if let Some(description) = data.description {
                card.description = description;
            }
            if let Some(is_active) = data.is_active {
                card.is_active = is_active;
            }
            card.updated_at = Utc::now();
            card.clone()
        }))
    }

    async fn delete_card(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.remove_card(id))
    }

    async fn create_comment(&self, mut data: CreateComment) -> StoreResult<Comment> {
        let slug = assign_slug(&mut data);
        let mut t = self.tables.write().await;

        ensure_unique_slug(&t.comments, &slug, "card_comments_slug_key")?;
        if !t.cards.contains_key(&data.card_id) {
            return Err(missing("card_comments_card_id_fkey"));
        }

        let now = Utc::now();
        let comment = Comment {
            id: t.next_id(),
            slug,
            card_id: data.card_id,
            user_id: data.user_id,
            body: data.body,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn visible_comments(
        &self,
        user_id: i64,
        options: &ListOptions,
    ) -> StoreResult<Vec<Comment>> {
        let t = self.tables.read().await;
        let Ok(card_id) = Tables::parent_id(&t.cards, options) else {
            return Ok(Vec::new());
        };
        Ok(page(
            t.comments.values().filter(|c| {
                card_id.map_or(true, |id| c.card_id == id) && t.card_visible(c.card_id, user_id)
            }),
            options,
        ))
    }

    async fn visible_comment(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Comment>> {
        let t = self.tables.read().await;
        Ok(find_by_slug(&t.comments, slug)
            .filter(|c| t.card_visible(c.card_id, user_id))
            .cloned())
    }

    async fn update_comment(&self, id: i64, data: UpdateComment) -> StoreResult<Option<Comment>> {
        let mut t = self.tables.write().await;
        Ok(t.comments.get_mut(&id).map(|comment| {
            if let Some(body) = data.body {
                comment.body = body;
            }
            if let Some(is_active) = data.is_active {
                comment.is_active = is_active;
            }
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }

    async fn create_attachment(&self, mut data: CreateAttachment) -> StoreResult<Attachment> {
        let slug = assign_slug(&mut data);
        let mut t = self.tables.write().await;

        ensure_unique_slug(&t.attachments, &slug, "card_attachments_slug_key")?;
        if !t.cards.contains_key(&data.card_id) {
            return Err(missing("card_attachments_card_id_fkey"));
        }

        let now = Utc::now();
        let attachment = Attachment {
            id: t.next_id(),
            slug,
            card_id: data.card_id,
            blob_ref: data.blob_ref,
            file_name: data.file_name,
            content_type: data.content_type,
            size_bytes: data.size_bytes,
            is_active: true,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        t.attachments.insert(attachment.id, attachment.clone());
        Ok(attachment)
    }

    async fn visible_attachments(
        &self,
        user_id: i64,
        options: &ListOptions,
    ) -> StoreResult<Vec<Attachment>> {
        let t = self.tables.read().await;
        let Ok(card_id) = Tables::parent_id(&t.cards, options) else {
            return Ok(Vec::new());
        };
        Ok(page(
            t.attachments.values().filter(|a| {
                card_id.map_or(true, |id| a.card_id == id) && t.card_visible(a.card_id, user_id)
            }),
            options,
        ))
    }

    async fn visible_attachment(
        &self,
        user_id: i64,
        slug: &Slug,
    ) -> StoreResult<Option<Attachment>> {
        let t = self.tables.read().await;
        Ok(find_by_slug(&t.attachments, slug)
            .filter(|a| t.card_visible(a.card_id, user_id))
            .cloned())
    }

    async fn update_attachment(
        &self,
        id: i64,
        data: UpdateAttachment,
    ) -> StoreResult<Option<Attachment>> {
        let mut t = self.tables.write().await;
        Ok(t.attachments.get_mut(&id).map(|attachment| {
            if let Some(file_name) = data.file_name {
                attachment.file_name = file_name;
            }
            if let Some(is_active) = data.is_active {
                attachment.is_active = is_active;
            }
            attachment.updated_at = Utc::now();
            attachment.clone()
        }))
    }

    async fn delete_attachment(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.attachments.remove(&id).is_some())
    }

    async fn attachment_blob_refs(&self, scope: AttachmentScope) -> StoreResult<Vec<String>> {
        let t = self.tables.read().await;
        Ok(t.attachments
            .values()
            .filter(|a| match scope {
                AttachmentScope::Card(id) => a.card_id == id,
                AttachmentScope::List(id) => t.cards.get(&a.card_id).map(|c| c.list_id) == Some(id),
                AttachmentScope::Board(id) => t.board_of_card(a.card_id) == Some(id),
            })
            .map(|a| a.blob_ref.clone())
            .collect())
    }

    async fn create_tag(&self, mut data: CreateTag) -> StoreResult<Tag> {
        let slug = assign_slug(&mut data);
        let mut t = self.tables.write().await;

        ensure_unique_slug(&t.tags, &slug, "card_tags_slug_key")?;
        if !t.cards.contains_key(&data.card_id) {
            return Err(missing("card_tags_card_id_fkey"));
        }
        if t
            .tags
            .values()
            .any(|tag| tag.card_id == data.card_id && tag.label == data.label)
        {
            return Err(StoreError::Conflict("card_tags_card_id_label_key".to_string()));
        }

        let now = Utc::now();
        let tag = Tag {
            id: t.next_id(),
            slug,
            card_id: data.card_id,
            label: data.label,
            is_active: true,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        t.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn visible_tags(&self, user_id: i64, options: &ListOptions) -> StoreResult<Vec<Tag>> {
        let t = self.tables.read().await;
        let Ok(card_id) = Tables::parent_id(&t.cards, options) else {
            return Ok(Vec::new());
        };
        Ok(page(
            t.tags.values().filter(|tag| {
                card_id.map_or(true, |id| tag.card_id == id) && t.card_visible(tag.card_id, user_id)
            }),
            options,
        ))
    }

    async fn visible_tag(&self, user_id: i64, slug: &Slug) -> StoreResult<Option<Tag>> {
        let t = self.tables.read().await;
        Ok(find_by_slug(&t.tags, slug)
            .filter(|tag| t.card_visible(tag.card_id, user_id))
            .cloned())
    }

    async fn update_tag(&self, id: i64, data: UpdateTag) -> StoreResult<Option<Tag>> {
        let mut t = self.tables.write().await;

        if let (Some(label), Some(current)) = (&data.label, t.tags.get(&id)) {
            let card_id = current.card_id;
            if t
                .tags
                .values()
                .any(|tag| tag.id != id && tag.card_id == card_id && &tag.label == label)
            {
                return Err(StoreError::Conflict("card_tags_card_id_label_key".to_string()));
            }
        }

        Ok(t.tags.get_mut(&id).map(|tag| {
            if let Some(label) = data.label {
                tag.label = label;
            }
            if let Some(is_active) = data.is_active {
                tag.is_active = is_active;
            }
            tag.updated_at = Utc::now();
            tag.clone()
        }))
    }

    async fn delete_tag(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.tags.remove(&id).is_some())
    }

    async fn board_member(&self, board_id: i64, user_id: i64) -> StoreResult<Option<BoardMember>> {
        Ok(self
            .tables
            .read()
            .await
            .board_members
            .get(&(board_id, user_id))
            .cloned())
    }

    async fn board_members(&self, board_id: i64) -> StoreResult<Vec<MemberListing>> {
        let t = self.tables.read().await;
        let mut members: Vec<&BoardMember> = t
            .board_members
            .values()
            .filter(|m| m.board_id == board_id)
            .collect();
        members.sort_by_key(|m| m.id);
        Ok(members
            .into_iter()
            .filter_map(|m| t.listing(m.user_id, m.is_active, Some(m.is_admin), m.joined_at))
            .collect())
    }

    async fn grant_board_member(
        &self,
        board_id: i64,
        user_id: i64,
        is_admin: bool,
    ) -> StoreResult<BoardMember> {
        let mut t = self.tables.write().await;
        if !t.boards.contains_key(&board_id) {
            return Err(missing("board_members_board_id_fkey"));
        }
        if !t.users.contains_key(&user_id) {
            return Err(missing("board_members_user_id_fkey"));
        }

        if let Some(member) = t.board_members.get_mut(&(board_id, user_id)) {
            member.is_active = true;
            member.is_admin |= is_admin;
            return Ok(member.clone());
        }

        let member = BoardMember {
            id: t.next_id(),
            board_id,
            user_id,
            is_active: true,
            is_admin,
            joined_at: Utc::now(),
        };
        t.board_members.insert((board_id, user_id), member.clone());
        Ok(member)
    }

    async fn update_board_member(
        &self,
        board_id: i64,
        user_id: i64,
        data: UpdateBoardMember,
    ) -> StoreResult<MemberChange> {
        let mut t = self.tables.write().await;
        let admins = t
            .board_members
            .values()
            .filter(|m| m.board_id == board_id && m.is_active && m.is_admin)
            .count();

        let Some(member) = t.board_members.get_mut(&(board_id, user_id)) else {
            return Ok(MemberChange::NotMember);
        };
        if member.loses_admin(&data) && admins <= 1 {
            return Ok(MemberChange::LastAdmin);
        }

        if let Some(is_active) = data.is_active {
            member.is_active = is_active;
        }
        if let Some(is_admin) = data.is_admin {
            member.is_admin = is_admin;
        }
        Ok(MemberChange::Updated(member.clone()))
    }

    async fn count_board_admins(&self, board_id: i64) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.board_members
            .values()
            .filter(|m| m.board_id == board_id && m.is_active && m.is_admin)
            .count() as i64)
    }

    async fn participant(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<Participant>> {
        let t = self.tables.read().await;
        Ok(t.participants(kind).get(&(resource_id, user_id)).cloned())
    }

    async fn participants(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
    ) -> StoreResult<Vec<MemberListing>> {
        let t = self.tables.read().await;
        let mut rows: Vec<&Participant> = t
            .participants(kind)
            .values()
            .filter(|p| p.resource_id == resource_id)
            .collect();
        rows.sort_by_key(|p| p.id);
        Ok(rows
            .into_iter()
            .filter_map(|p| t.listing(p.user_id, p.is_active, None, p.joined_at))
            .collect())
    }

    async fn grant_participant(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
    ) -> StoreResult<Participant> {
        let mut t = self.tables.write().await;
        let resource_exists = match kind {
            ParticipantKind::List => t.lists.contains_key(&resource_id),
            ParticipantKind::Card => t.cards.contains_key(&resource_id),
        };
        if !resource_exists || !t.users.contains_key(&user_id) {
            return Err(missing(match kind {
                ParticipantKind::List => "list_members_list_id_fkey",
                ParticipantKind::Card => "card_members_card_id_fkey",
            }));
        }

        if let Some(participant) = t.participants_mut(kind).get_mut(&(resource_id, user_id)) {
            participant.is_active = true;
            return Ok(participant.clone());
        }

        let participant = Participant {
            id: t.next_id(),
            resource_id,
            user_id,
            is_active: true,
            joined_at: Utc::now(),
        };
        t.participants_mut(kind)
            .insert((resource_id, user_id), participant.clone());
        Ok(participant)
    }

    async fn set_participant_active(
        &self,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
        is_active: bool,
    ) -> StoreResult<Option<Participant>> {
        let mut t = self.tables.write().await;
        Ok(t.participants_mut(kind)
            .get_mut(&(resource_id, user_id))
            .map(|participant| {
                participant.is_active = is_active;
                participant.clone()
            }))
    }
}
