/// Tag endpoints
///
/// - `GET /v1/tags` - `?parent=<card>` narrows to one card
/// - `POST /v1/tags` - Any member who can see the `card`
/// - `GET|PUT|PATCH|DELETE /v1/tags/:slug`

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppQuery, ListQuery},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskboard_shared::auth::context::AuthContext;
use taskboard_shared::services::tags::{
    self, CreateTagInput, ReplaceTagInput, UpdateTagInput,
};
use taskboard_shared::services::views::TagView;
use taskboard_shared::slug::Slug;

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Vec<TagView>>> {
    Ok(Json(tags::list(&state.services, &auth, &query.into()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateTagInput>,
) -> ApiResult<(StatusCode, Json<TagView>)> {
    let tag = tags::create(&state.services, &auth, req).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Json<TagView>> {
    Ok(Json(tags::get(&state.services, &auth, &slug).await?))
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<ReplaceTagInput>,
) -> ApiResult<Json<TagView>> {
    Ok(Json(
        tags::update(&state.services, &auth, &slug, req.into()).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<UpdateTagInput>,
) -> ApiResult<Json<TagView>> {
    Ok(Json(tags::update(&state.services, &auth, &slug, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<StatusCode> {
    tags::delete(&state.services, &auth, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
