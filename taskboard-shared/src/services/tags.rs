/// Tag lifecycle
///
/// Tags are collaborative: anyone who can see the card can add, rename,
/// deactivate or delete them. A label is unique per card.

use serde::Deserialize;
use validator::Validate;

use super::views::{TagView, ViewBuilder};
use super::{parent_card, ServiceContext};
use crate::auth::context::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::tag::{CreateTag, UpdateTag};
use crate::models::ListOptions;
use crate::slug::Slug;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTagInput {
    /// Parent card slug
    pub card: Slug,

    #[validate(length(min = 1, max = 50, message = "Label must be 1 to 50 characters"))]
    pub label: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTagInput {
    #[validate(length(min = 1, max = 50, message = "Label must be 1 to 50 characters"))]
    pub label: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceTagInput {
    pub label: String,
    #[serde(default = "super::boards::default_active")]
    pub is_active: bool,
}

impl From<ReplaceTagInput> for UpdateTagInput {
    fn from(input: ReplaceTagInput) -> Self {
        Self {
            label: Some(input.label),
            is_active: Some(input.is_active),
        }
    }
}

fn normalize_label(label: &str) -> ServiceResult<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(ServiceError::invalid("label", "Label must be 1 to 50 characters"));
    }
    Ok(label.to_string())
}

/// Tags on the caller's boards; `options.parent` filters by card slug
pub async fn list(
    ctx: &ServiceContext,
    auth: &AuthContext,
    options: &ListOptions,
) -> ServiceResult<Vec<TagView>> {
    let tags = ctx.visible(auth).tags(options).await?;

    let mut views = ViewBuilder::new(ctx.store());
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        out.push(views.tag(tag).await?);
    }
    Ok(out)
}

pub async fn get(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<TagView> {
    let tag = ctx.visible(auth).tag(slug).await?;
    ViewBuilder::new(ctx.store()).tag(tag).await
}

pub async fn create(
    ctx: &ServiceContext,
    auth: &AuthContext,
    input: CreateTagInput,
) -> ServiceResult<TagView> {
    input.validate()?;
    let label = normalize_label(&input.label)?;

    let card = parent_card(ctx, auth, &input.card).await?;

    let tag = ctx
        .store
        .create_tag(CreateTag {
            slug: None,
            card_id: card.id,
            label,
            created_by: auth.user_id,
        })
        .await?;

    tracing::info!(tag = %tag.slug, card = %card.slug, label = %tag.label, "tag created");
    ViewBuilder::new(ctx.store()).tag(tag).await
}

pub async fn update(
    ctx: &ServiceContext,
    auth: &AuthContext,
    slug: &Slug,
    input: UpdateTagInput,
) -> ServiceResult<TagView> {
    input.validate()?;
    let label = input.label.as_deref().map(normalize_label).transpose()?;

    let tag = ctx.visible(auth).tag(slug).await?;

    let updated = ctx
        .store
        .update_tag(
            tag.id,
            UpdateTag {
                label,
                is_active: input.is_active,
            },
        )
        .await?
        .ok_or_else(|| ServiceError::not_found("Tag"))?;

    ViewBuilder::new(ctx.store()).tag(updated).await
}

pub async fn delete(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<()> {
    let tag = ctx.visible(auth).tag(slug).await?;

    if !ctx.store.delete_tag(tag.id).await? {
        return Err(ServiceError::not_found("Tag"));
    }

    tracing::info!(tag = %tag.slug, user = %auth.user_slug, "tag deleted");
    Ok(())
}
