/// List lifecycle
///
/// Only an admin of the parent board can create a list; the creator becomes
/// the list's first participant. Updates and deletes need the same authority.

use serde::Deserialize;
use validator::Validate;

use super::attachments::discard_blobs;
use super::boards::default_active;
use super::views::{ListView, ViewBuilder};
use super::ServiceContext;
use crate::auth::authorization::require_admin;
use crate::auth::context::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::attachment::AttachmentScope;
use crate::models::list::{CreateList, UpdateList};
use crate::models::ListOptions;
use crate::slug::Slug;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateListInput {
    /// Parent board slug
    pub board: Slug,

    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateListInput {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceListInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl From<ReplaceListInput> for UpdateListInput {
    fn from(input: ReplaceListInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            is_active: Some(input.is_active),
        }
    }
}

/// Lists on the caller's boards; `options.parent` filters by board slug
pub async fn list(
    ctx: &ServiceContext,
    auth: &AuthContext,
    options: &ListOptions,
) -> ServiceResult<Vec<ListView>> {
    let lists = ctx.visible(auth).lists(options).await?;

    let mut views = ViewBuilder::new(ctx.store());
    let mut out = Vec::with_capacity(lists.len());
    for list in lists {
        out.push(views.list(list).await?);
    }
    Ok(out)
}

pub async fn get(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<ListView> {
    let list = ctx.visible(auth).list(slug).await?;
    ViewBuilder::new(ctx.store()).list(list).await
}

pub async fn create(
    ctx: &ServiceContext,
    auth: &AuthContext,
    input: CreateListInput,
) -> ServiceResult<ListView> {
    input.validate()?;

    let board = ctx
        .visible(auth)
        .parent_board(&input.board, ctx.parent_resolution)
        .await?;
    require_admin(ctx.store(), &board, auth.user_id).await?;

    let list = ctx
        .store
        .create_list(CreateList {
            slug: None,
            board_id: board.id,
            name: input.name.trim().to_string(),
            description: input.description,
            created_by: auth.user_id,
        })
        .await?;

    tracing::info!(list = %list.slug, board = %board.slug, user = %auth.user_slug, "list created");
    ViewBuilder::new(ctx.store()).list(list).await
}

pub async fn update(
    ctx: &ServiceContext,
    auth: &AuthContext,
    slug: &Slug,
    input: UpdateListInput,
) -> ServiceResult<ListView> {
    input.validate()?;

    let list = ctx.visible(auth).list(slug).await?;
    require_admin(ctx.store(), &list, auth.user_id).await?;

    let updated = ctx
        .store
        .update_list(
            list.id,
            UpdateList {
                name: input.name.map(|n| n.trim().to_string()),
                description: input.description,
                is_active: input.is_active,
            },
        )
        .await?
        .ok_or_else(|| ServiceError::not_found("List"))?;

    tracing::info!(list = %updated.slug, user = %auth.user_slug, "list updated");
    ViewBuilder::new(ctx.store()).list(updated).await
}

pub async fn delete(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<()> {
    let list = ctx.visible(auth).list(slug).await?;
    require_admin(ctx.store(), &list, auth.user_id).await?;

    let blobs = ctx
        .store
        .attachment_blob_refs(AttachmentScope::List(list.id))
        .await?;
    if !ctx.store.delete_list(list.id).await? {
        return Err(ServiceError::not_found("List"));
    }
    discard_blobs(ctx, blobs).await;

    tracing::info!(list = %list.slug, user = %auth.user_slug, "list deleted");
    Ok(())
}
