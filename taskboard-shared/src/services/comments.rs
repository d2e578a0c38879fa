/// Comment lifecycle
///
/// Anyone who can see a card may comment on it. A comment can be edited or
/// deleted by its author or by an admin of the board.

use serde::Deserialize;
use validator::Validate;

use super::views::{CommentView, ViewBuilder};
use super::{parent_card, ServiceContext};
use crate::auth::authorization::is_admin;
use crate::auth::context::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::comment::{Comment, CreateComment, UpdateComment};
use crate::models::ListOptions;
use crate::slug::Slug;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentInput {
    /// Parent card slug
    pub card: Slug,

    #[validate(length(min = 1, max = 500, message = "Comment must be 1 to 500 characters"))]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCommentInput {
    #[validate(length(min = 1, max = 500, message = "Comment must be 1 to 500 characters"))]
    pub body: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceCommentInput {
    pub body: String,
    #[serde(default = "super::boards::default_active")]
    pub is_active: bool,
}

impl From<ReplaceCommentInput> for UpdateCommentInput {
    fn from(input: ReplaceCommentInput) -> Self {
        Self {
            body: Some(input.body),
            is_active: Some(input.is_active),
        }
    }
}

async fn require_author_or_admin(
    ctx: &ServiceContext,
    auth: &AuthContext,
    comment: &Comment,
) -> ServiceResult<()> {
    if comment.user_id == auth.user_id || is_admin(ctx.store(), comment, auth.user_id).await? {
        return Ok(());
    }
    Err(ServiceError::PermissionDenied(
        "Only the author or a board admin can change this comment".to_string(),
    ))
}

/// Comments on the caller's boards; `options.parent` filters by card slug
pub async fn list(
    ctx: &ServiceContext,
    auth: &AuthContext,
    options: &ListOptions,
) -> ServiceResult<Vec<CommentView>> {
    let comments = ctx.visible(auth).comments(options).await?;

    let mut views = ViewBuilder::new(ctx.store());
    let mut out = Vec::with_capacity(comments.len());
    for comment in comments {
        out.push(views.comment(comment).await?);
    }
    Ok(out)
}

pub async fn get(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<CommentView> {
    let comment = ctx.visible(auth).comment(slug).await?;
    ViewBuilder::new(ctx.store()).comment(comment).await
}

pub async fn create(
    ctx: &ServiceContext,
    auth: &AuthContext,
    input: CreateCommentInput,
) -> ServiceResult<CommentView> {
    input.validate()?;

    let card = parent_card(ctx, auth, &input.card).await?;

    let comment = ctx
        .store
        .create_comment(CreateComment {
            slug: None,
            card_id: card.id,
            user_id: auth.user_id,
            body: input.body,
        })
        .await?;

    tracing::info!(comment = %comment.slug, card = %card.slug, user = %auth.user_slug, "comment created");
    ViewBuilder::new(ctx.store()).comment(comment).await
}

pub async fn update(
    ctx: &ServiceContext,
    auth: &AuthContext,
    slug: &Slug,
    input: UpdateCommentInput,
) -> ServiceResult<CommentView> {
    input.validate()?;

    let comment = ctx.visible(auth).comment(slug).await?;
    require_author_or_admin(ctx, auth, &comment).await?;

    let updated = ctx
        .store
        .update_comment(
            comment.id,
            UpdateComment {
                body: input.body,
                is_active: input.is_active,
            },
        )
        .await?
        .ok_or_else(|| ServiceError::not_found("Comment"))?;

    tracing::info!(comment = %updated.slug, user = %auth.user_slug, "comment updated");
    ViewBuilder::new(ctx.store()).comment(updated).await
}

pub async fn delete(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<()> {
    let comment = ctx.visible(auth).comment(slug).await?;
    require_author_or_admin(ctx, auth, &comment).await?;

    if !ctx.store.delete_comment(comment.id).await? {
        return Err(ServiceError::not_found("Comment"));
    }

    tracing::info!(comment = %comment.slug, user = %auth.user_slug, "comment deleted");
    Ok(())
}
