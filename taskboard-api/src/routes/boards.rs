/// Board endpoints
///
/// - `GET /v1/boards` - Boards the caller is an active member of
/// - `POST /v1/boards` - Create; the caller becomes its admin
/// - `GET /v1/boards/:slug`
/// - `PUT /v1/boards/:slug` - Replace (admin)
/// - `PATCH /v1/boards/:slug` - Partial update (admin)
/// - `DELETE /v1/boards/:slug` - Delete with the whole subtree (admin)

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
use taskboard_shared::services::boards::{
    self, CreateBoardInput, ReplaceBoardInput, UpdateBoardInput,
};
use taskboard_shared::services::views::BoardView;
use taskboard_shared::slug::Slug;

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Vec<BoardView>>> {
    Ok(Json(boards::list(&state.services, &auth, &query.into()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateBoardInput>,
) -> ApiResult<(StatusCode, Json<BoardView>)> {
    let board = boards::create(&state.services, &auth, req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Json<BoardView>> {
    Ok(Json(boards::get(&state.services, &auth, &slug).await?))
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<ReplaceBoardInput>,
) -> ApiResult<Json<BoardView>> {
    Ok(Json(
        boards::update(&state.services, &auth, &slug, req.into()).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<UpdateBoardInput>,
) -> ApiResult<Json<BoardView>> {
    Ok(Json(boards::update(&state.services, &auth, &slug, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<StatusCode> {
    boards::delete(&state.services, &auth, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
