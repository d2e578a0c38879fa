/// Card lifecycle
///
/// Mirrors lists one level down: admin authority on the owning board is
/// required to create, update or delete a card.

use serde::Deserialize;
use validator::Validate;

use super::attachments::discard_blobs;
use super::boards::default_active;
use super::views::{CardView, ViewBuilder};
use super::ServiceContext;
use crate::auth::authorization::require_admin;
use crate::auth::context::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::attachment::AttachmentScope;
use crate::models::card::{CreateCard, UpdateCard};
use crate::models::ListOptions;
use crate::slug::Slug;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCardInput {
    /// Parent list slug
    pub list: Slug,

    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCardInput {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceCardInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl From<ReplaceCardInput> for UpdateCardInput {
    fn from(input: ReplaceCardInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            is_active: Some(input.is_active),
        }
    }
}

/// Cards on the caller's boards; `options.parent` filters by list slug
pub async fn list(
    ctx: &ServiceContext,
    auth: &AuthContext,
    options: &ListOptions,
) -> ServiceResult<Vec<CardView>> {
    let cards = ctx.visible(auth).cards(options).await?;

    let mut views = ViewBuilder::new(ctx.store());
    let mut out = Vec::with_capacity(cards.len());
    for card in cards {
        out.push(views.card(card).await?);
    }
    Ok(out)
}

pub async fn get(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<CardView> {
    let card = ctx.visible(auth).card(slug).await?;
    ViewBuilder::new(ctx.store()).card(card).await
}

pub async fn create(
    ctx: &ServiceContext,
    auth: &AuthContext,
    input: CreateCardInput,
) -> ServiceResult<CardView> {
    input.validate()?;

    let list = ctx
        .visible(auth)
        .parent_list(&input.list, ctx.parent_resolution)
        .await?;
    require_admin(ctx.store(), &list, auth.user_id).await?;

    let card = ctx
        .store
        .create_card(CreateCard {
            slug: None,
            list_id: list.id,
            name: input.name.trim().to_string(),
            description: input.description,
            created_by: auth.user_id,
        })
        .await?;

    tracing::info!(card = %card.slug, list = %list.slug, user = %auth.user_slug, "card created");
    ViewBuilder::new(ctx.store()).card(card).await
}

pub async fn update(
    ctx: &ServiceContext,
    auth: &AuthContext,
    slug: &Slug,
    input: UpdateCardInput,
) -> ServiceResult<CardView> {
    input.validate()?;

    let card = ctx.visible(auth).card(slug).await?;
    require_admin(ctx.store(), &card, auth.user_id).await?;

    let updated = ctx
        .store
        .update_card(
            card.id,
            UpdateCard {
                name: input.name.map(|n| n.trim().to_string()),
                description: input.description,
                is_active: input.is_active,
            },
        )
        .await?
        .ok_or_else(|| ServiceError::not_found("Card"))?;

    tracing::info!(card = %updated.slug, user = %auth.user_slug, "card updated");
    ViewBuilder::new(ctx.store()).card(updated).await
}

pub async fn delete(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<()> {
    let card = ctx.visible(auth).card(slug).await?;
    require_admin(ctx.store(), &card, auth.user_id).await?;

    let blobs = ctx
        .store
        .attachment_blob_refs(AttachmentScope::Card(card.id))
        .await?;
    if !ctx.store.delete_card(card.id).await? {
        return Err(ServiceError::not_found("Card"));
    }
    discard_blobs(ctx, blobs).await;

    tracing::info!(card = %card.slug, user = %auth.user_slug, "card deleted");
    Ok(())
}
