/// Attachment endpoints
///
/// - `GET /v1/attachments` - `?parent=<card>` narrows to one card
/// - `POST /v1/attachments` - Multipart upload with fields `card` and `file`
/// - `GET|PUT|PATCH|DELETE /v1/attachments/:slug` - Metadata
/// - `GET /v1/attachments/:slug/content` - The payload itself
///
/// # Upload
///
/// ```text
/// POST /v1/attachments
/// Content-Type: multipart/form-data; boundary=...
///
/// card=<card slug>
/// file=<binary, with filename and content type>
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{AppJson, AppQuery, ListQuery},
};
use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        Path, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use taskboard_shared::auth::context::AuthContext;
use taskboard_shared::services::attachments::{
    self, NewUpload, ReplaceAttachmentInput, UpdateAttachmentInput,
};
use taskboard_shared::services::views::AttachmentView;
use taskboard_shared::slug::Slug;

fn required(field: &str) -> ApiError {
    ApiError::ValidationError(vec![ValidationErrorDetail {
        field: field.to_string(),
        message: "This field is required.".to_string(),
    }])
}

/// `Content-Disposition` value that is safe to put in a header
fn content_disposition(file_name: &str) -> HeaderValue {
    let ascii: String = file_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_' | ' ') {
                ch
            } else {
                '_'
            }
        })
        .collect();

    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", ascii.trim()))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Vec<AttachmentView>>> {
    Ok(Json(
        attachments::list(&state.services, &auth, &query.into()).await?,
    ))
}

/// Upload a file to a card
///
/// # Errors
///
/// - `422 Unprocessable Entity`: missing `card` or `file`, empty or oversized file
/// - `404 Not Found`: the card is not visible to the caller
pub async fn upload(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<AttachmentView>)> {
    let mut multipart = multipart?;

    let mut card = None;
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("card") => card = Some(Slug::new(field.text().await?.trim())),
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let payload = field.bytes().await?;
                file = Some((file_name, content_type, payload));
            }
            _ => {}
        }
    }

    let card = card.ok_or_else(|| required("card"))?;
    let (file_name, content_type, payload) = file.ok_or_else(|| required("file"))?;

    let attachment = attachments::create(
        &state.services,
        &auth,
        NewUpload {
            card,
            file_name,
            content_type,
            payload,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Json<AttachmentView>> {
    Ok(Json(attachments::get(&state.services, &auth, &slug).await?))
}

/// Download the payload
///
/// Served with the stored content type and as an attachment, never inline.
pub async fn content(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Response> {
    let content = attachments::content(&state.services, &auth, &slug).await?;

    let content_type = HeaderValue::from_str(&content.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&content.file_name),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, no-store")),
        ],
        content.payload,
    )
        .into_response())
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<ReplaceAttachmentInput>,
) -> ApiResult<Json<AttachmentView>> {
    Ok(Json(
        attachments::update(&state.services, &auth, &slug, req.into()).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<UpdateAttachmentInput>,
) -> ApiResult<Json<AttachmentView>> {
    Ok(Json(
        attachments::update(&state.services, &auth, &slug, req).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<StatusCode> {
    attachments::delete(&state.services, &auth, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
