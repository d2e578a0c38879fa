/// Attachment lifecycle
///
/// Uploads store the payload in the blob store first and then record the
/// metadata row; if the row cannot be written the payload is discarded again.
/// Deleting an attachment, or any subtree above it, removes its payload.
/// Like tags, attachments are collaborative within the visible set.

use bytes::Bytes;
use serde::Deserialize;
use validator::Validate;

use super::views::{AttachmentView, ViewBuilder};
use super::{parent_card, ServiceContext};
use crate::auth::context::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::attachment::{CreateAttachment, UpdateAttachment};
use crate::models::ListOptions;
use crate::slug::Slug;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file uploaded to a card
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// Parent card slug
    pub card: Slug,
    pub file_name: String,
    pub content_type: Option<String>,
    pub payload: Bytes,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAttachmentInput {
    #[validate(length(min = 1, max = 255, message = "File name must be 1 to 255 characters"))]
    pub file_name: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceAttachmentInput {
    pub file_name: String,
    #[serde(default = "super::boards::default_active")]
    pub is_active: bool,
}

impl From<ReplaceAttachmentInput> for UpdateAttachmentInput {
    fn from(input: ReplaceAttachmentInput) -> Self {
        Self {
            file_name: Some(input.file_name),
            is_active: Some(input.is_active),
        }
    }
}

/// Attachment metadata together with its payload
#[derive(Debug, Clone)]
pub struct AttachmentContent {
    pub file_name: String,
    pub content_type: String,
    pub payload: Bytes,
}

/// Best-effort payload cleanup after rows are gone
pub(crate) async fn discard_blobs(ctx: &ServiceContext, references: Vec<String>) {
    for reference in references {
        if let Err(e) = ctx.blobs.delete(&reference).await {
            tracing::warn!(reference = %reference, error = %e, "failed to delete attachment payload");
        }
    }
}

fn validate_upload(ctx: &ServiceContext, upload: &NewUpload) -> ServiceResult<()> {
    let name_len = upload.file_name.chars().count();
    if name_len == 0 || name_len > 255 {
        return Err(ServiceError::invalid(
            "file",
            "File name must be 1 to 255 characters",
        ));
    }
    if upload.payload.is_empty() {
        return Err(ServiceError::invalid("file", "The submitted file is empty"));
    }
    if upload.payload.len() > ctx.max_upload_bytes {
        return Err(ServiceError::invalid(
            "file",
            &format!("File exceeds the {} byte upload limit", ctx.max_upload_bytes),
        ));
    }
    Ok(())
}

/// Attachments on the caller's boards; `options.parent` filters by card slug
pub async fn list(
    ctx: &ServiceContext,
    auth: &AuthContext,
    options: &ListOptions,
) -> ServiceResult<Vec<AttachmentView>> {
    let attachments = ctx.visible(auth).attachments(options).await?;

    let mut views = ViewBuilder::new(ctx.store());
    let mut out = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        out.push(views.attachment(attachment).await?);
    }
    Ok(out)
}

pub async fn get(
    ctx: &ServiceContext,
    auth: &AuthContext,
    slug: &Slug,
) -> ServiceResult<AttachmentView> {
    let attachment = ctx.visible(auth).attachment(slug).await?;
    ViewBuilder::new(ctx.store()).attachment(attachment).await
}

pub async fn create(
    ctx: &ServiceContext,
    auth: &AuthContext,
    upload: NewUpload,
) -> ServiceResult<AttachmentView> {
    validate_upload(ctx, &upload)?;

    let card = parent_card(ctx, auth, &upload.card).await?;

    let size_bytes = upload.payload.len() as i64;
    let blob_ref = ctx.blobs.put(&upload.file_name, upload.payload).await?;

    let created = ctx
        .store
        .create_attachment(CreateAttachment {
            slug: None,
            card_id: card.id,
            blob_ref: blob_ref.clone(),
            file_name: upload.file_name,
            content_type: upload
                .content_type
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            size_bytes,
            created_by: auth.user_id,
        })
        .await;

    let attachment = match created {
        Ok(attachment) => attachment,
        Err(e) => {
            discard_blobs(ctx, vec![blob_ref]).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        attachment = %attachment.slug,
        card = %card.slug,
        bytes = attachment.size_bytes,
        "attachment uploaded"
    );
    ViewBuilder::new(ctx.store()).attachment(attachment).await
}

/// Payload of a visible attachment
pub async fn content(
    ctx: &ServiceContext,
    auth: &AuthContext,
    slug: &Slug,
) -> ServiceResult<AttachmentContent> {
    let attachment = ctx.visible(auth).attachment(slug).await?;
    let payload = ctx.blobs.get(&attachment.blob_ref).await?;

    Ok(AttachmentContent {
        file_name: attachment.file_name,
        content_type: attachment.content_type,
        payload,
    })
}

pub async fn update(
    ctx: &ServiceContext,
    auth: &AuthContext,
    slug: &Slug,
    input: UpdateAttachmentInput,
) -> ServiceResult<AttachmentView> {
    input.validate()?;

    let attachment = ctx.visible(auth).attachment(slug).await?;

    let updated = ctx
        .store
        .update_attachment(
            attachment.id,
            UpdateAttachment {
                file_name: input.file_name,
                is_active: input.is_active,
            },
        )
        .await?
        .ok_or_else(|| ServiceError::not_found("Attachment"))?;

    tracing::info!(attachment = %updated.slug, user = %auth.user_slug, "attachment updated");
    ViewBuilder::new(ctx.store()).attachment(updated).await
}

pub async fn delete(ctx: &ServiceContext, auth: &AuthContext, slug: &Slug) -> ServiceResult<()> {
    let attachment = ctx.visible(auth).attachment(slug).await?;

    if !ctx.store.delete_attachment(attachment.id).await? {
        return Err(ServiceError::not_found("Attachment"));
    }
    discard_blobs(ctx, vec![attachment.blob_ref]).await;

    tracing::info!(attachment = %attachment.slug, user = %auth.user_slug, "attachment deleted");
    Ok(())
}
