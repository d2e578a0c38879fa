/// Comment endpoints
///
/// - `GET /v1/comments` - `?parent=<card>` narrows to one card
/// - `POST /v1/comments` - Any member who can see the `card`
/// - `GET|PUT|PATCH|DELETE /v1/comments/:slug` - Changes need the author or a board admin

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
use taskboard_shared::services::comments::{
    self, CreateCommentInput, ReplaceCommentInput, UpdateCommentInput,
};
use taskboard_shared::services::views::CommentView;
use taskboard_shared::slug::Slug;

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Vec<CommentView>>> {
    Ok(Json(comments::list(&state.services, &auth, &query.into()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateCommentInput>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let comment = comments::create(&state.services, &auth, req).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Json<CommentView>> {
    Ok(Json(comments::get(&state.services, &auth, &slug).await?))
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<ReplaceCommentInput>,
) -> ApiResult<Json<CommentView>> {
    Ok(Json(
        comments::update(&state.services, &auth, &slug, req.into()).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<UpdateCommentInput>,
) -> ApiResult<Json<CommentView>> {
    Ok(Json(comments::update(&state.services, &auth, &slug, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<StatusCode> {
    comments::delete(&state.services, &auth, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
