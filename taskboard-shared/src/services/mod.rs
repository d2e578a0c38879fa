/// Resource lifecycle controllers
///
/// One module per entity type. Every operation takes the shared
/// [`ServiceContext`], the authenticated caller, and its input, and returns
/// a view that exposes slugs only.
///
/// The rules all modules follow:
///
/// - Reads resolve through the caller's [`VisibleSet`]
/// - Creating a list or card needs admin authority on the parent's board
/// - Creating a comment, attachment or tag needs visibility of the card
/// - Updating or deleting a board, list or card needs admin authority
/// - Attachments and tags can be changed by anyone who can see them
/// - Comments can be changed by their author or a board admin
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_shared::auth::jwt::TokenSettings;
/// use taskboard_shared::blob::MemoryBlobStore;
/// use taskboard_shared::services::{accounts, boards, ServiceContext};
/// use taskboard_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), taskboard_shared::error::ServiceError> {
/// let ctx = ServiceContext::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryBlobStore::new()),
///     TokenSettings::new("a-secret-key-of-at-least-32-bytes!"),
/// );
///
/// let login = accounts::login(&ctx, accounts::LoginInput {
///     email: "ada@example.com".into(),
///     password: "hunter22".into(),
/// }).await?;
/// let auth = accounts::authenticate(&ctx, &login.access_token).await?;
///
/// let board = boards::create(&ctx, &auth, boards::CreateBoardInput {
///     name: "Sprint".into(),
///     description: String::new(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod accounts;
pub mod attachments;
pub mod boards;
pub mod cards;
pub mod comments;
pub mod lists;
pub mod members;
pub mod tags;
pub mod views;

use std::sync::Arc;

use crate::auth::authorization::{require_member, resolve_owning_board};
use crate::auth::context::AuthContext;
use crate::auth::jwt::TokenSettings;
use crate::blob::BlobStore;
use crate::error::{ServiceError, ServiceResult};
use crate::models::card::Card;
use crate::slug::Slug;
use crate::store::{SharedStore, Store};
use crate::visibility::{ParentResolution, VisibleSet};

/// Default cap on attachment payloads (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Dependencies shared by every service call
#[derive(Clone)]
pub struct ServiceContext {
    pub store: SharedStore,
    pub blobs: Arc<dyn BlobStore>,
    pub tokens: TokenSettings,
    pub parent_resolution: ParentResolution,
    pub max_upload_bytes: usize,
}

impl ServiceContext {
    pub fn new(store: SharedStore, blobs: Arc<dyn BlobStore>, tokens: TokenSettings) -> Self {
        Self {
            store,
            blobs,
            tokens,
            parent_resolution: ParentResolution::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_parent_resolution(mut self, policy: ParentResolution) -> Self {
        self.parent_resolution = policy;
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// The caller's visible set
    pub fn visible(&self, auth: &AuthContext) -> VisibleSet<'_> {
        VisibleSet::new(self.store.as_ref(), auth.user_id)
    }
}

/// Resolves the card a new comment, attachment or tag hangs off
///
/// Under global resolution the card is found without scoping, so board
/// membership is checked explicitly afterwards.
pub(crate) async fn parent_card(
    ctx: &ServiceContext,
    auth: &AuthContext,
    slug: &Slug,
) -> ServiceResult<Card> {
    let card = ctx
        .visible(auth)
        .parent_card(slug, ctx.parent_resolution)
        .await?;

    if ctx.parent_resolution == ParentResolution::Global {
        let board_id = resolve_owning_board(ctx.store(), &card)
            .await?
            .ok_or_else(|| ServiceError::not_found("Card"))?;
        require_member(ctx.store(), board_id, auth.user_id).await?;
    }

    Ok(card)
}
