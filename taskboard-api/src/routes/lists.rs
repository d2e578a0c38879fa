/// List endpoints
///
/// - `GET /v1/lists` - Lists on the caller's boards; `?parent=<board>` narrows
/// - `POST /v1/lists` - Create under `board` (admin of that board)
/// - `GET|PUT|PATCH|DELETE /v1/lists/:slug` - Changes need board admin

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
use taskboard_shared::services::lists::{
    self, CreateListInput, ReplaceListInput, UpdateListInput,
};
use taskboard_shared::services::views::ListView;
use taskboard_shared::slug::Slug;

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Vec<ListView>>> {
    Ok(Json(lists::list(&state.services, &auth, &query.into()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateListInput>,
) -> ApiResult<(StatusCode, Json<ListView>)> {
    let list = lists::create(&state.services, &auth, req).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Json<ListView>> {
    Ok(Json(lists::get(&state.services, &auth, &slug).await?))
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<ReplaceListInput>,
) -> ApiResult<Json<ListView>> {
    Ok(Json(
        lists::update(&state.services, &auth, &slug, req.into()).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<UpdateListInput>,
) -> ApiResult<Json<ListView>> {
    Ok(Json(lists::update(&state.services, &auth, &slug, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<StatusCode> {
    lists::delete(&state.services, &auth, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
