/// Board lifecycle
///
/// Any authenticated user can create a board and becomes its first active
/// admin in the same transaction. Updating or deleting requires admin
/// authority; deleting removes the whole subtree and its attachment payloads.

use serde::Deserialize;
use validator::Validate;

use super::attachments::discard_blobs;
use super::views::{BoardView, ViewBuilder};
use super::ServiceContext;
use crate::auth::authorization::require_admin;
use crate::auth::context::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::attachment::AttachmentScope;
use crate::models::board::{CreateBoard, UpdateBoard};
use crate::models::ListOptions;
use crate::slug::Slug;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBoardInput {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: String,
}

/// Partial update; `PUT` sends every field
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBoardInput {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

/// Full replacement body for `PUT`
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceBoardInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

pub(crate) fn default_active() -> bool {
    true
}

impl From<ReplaceBoardInput> for UpdateBoardInput {
    fn from(input: ReplaceBoardInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            is_active: Some(input.is_active),
        }
    }
}

pub async fn list(
    ctx: &ServiceContext,
    auth: &AuthContext,
    options: &ListOptions,
) -> ServiceResult<Vec<BoardView>> {
    let boards = ctx.visible(auth).boards(options).await?;

    let mut views = ViewBuilder::new(ctx.store());
    let mut out = Vec::with_capacity(boards.len());
    for board in boards {
        out.push(views.board(board).await?);
    }
    Ok(out)
}

pub async fn get(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<BoardView> {
    let board = ctx.visible(auth).board(slug).await?;
    ViewBuilder::new(ctx.store()).board(board).await
}

pub async fn create(
    ctx: &ServiceContext,
    auth: &AuthContext,
    input: CreateBoardInput,
) -> ServiceResult<BoardView> {
    input.validate()?;

    let board = ctx
        .store
        .create_board(CreateBoard {
            slug: None,
            name: input.name.trim().to_string(),
            description: input.description,
            created_by: auth.user_id,
        })
        .await?;

    tracing::info!(board = %board.slug, user = %auth.user_slug, "board created");
    ViewBuilder::new(ctx.store()).board(board).await
}

pub async fn update(
    ctx: &ServiceContext,
    auth: &AuthContext,
    slug: &Slug,
    input: UpdateBoardInput,
) -> ServiceResult<BoardView> {
    input.validate()?;

    let board = ctx.visible(auth).board(slug).await?;
    require_admin(ctx.store(), &board, auth.user_id).await?;

    let updated = ctx
        .store
        .update_board(
            board.id,
            UpdateBoard {
                name: input.name.map(|n| n.trim().to_string()),
                description: input.description,
                is_active: input.is_active,
            },
        )
        .await?
        .ok_or_else(|| ServiceError::not_found("Board"))?;

    tracing::info!(board = %updated.slug, user = %auth.user_slug, "board updated");
    ViewBuilder::new(ctx.store()).board(updated).await
}

pub async fn delete(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<()> {
    let board = ctx.visible(auth).board(slug).await?;
    require_admin(ctx.store(), &board, auth.user_id).await?;

    let blobs = ctx
        .store
        .attachment_blob_refs(AttachmentScope::Board(board.id))
        .await?;
    if !ctx.store.delete_board(board.id).await? {
        return Err(ServiceError::not_found("Board"));
    }
    discard_blobs(ctx, blobs).await;

    tracing::info!(board = %board.slug, user = %auth.user_slug, "board deleted");
    Ok(())
}
