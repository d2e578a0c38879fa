/// Card endpoints
///
/// - `GET /v1/cards` - `?parent=<list>` narrows to one list
/// - `POST /v1/cards` - Create under `list` (board admin)
/// - `GET|PUT|PATCH|DELETE /v1/cards/:slug` - Changes need board admin

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
use taskboard_shared::services::cards::{
    self, CreateCardInput, ReplaceCardInput, UpdateCardInput,
};
use taskboard_shared::services::views::CardView;
use taskboard_shared::slug::Slug;

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Vec<CardView>>> {
    Ok(Json(cards::list(&state.services, &auth, &query.into()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateCardInput>,
) -> ApiResult<(StatusCode, Json<CardView>)> {
    let card = cards::create(&state.services, &auth, req).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Json<CardView>> {
    Ok(Json(cards::get(&state.services, &auth, &slug).await?))
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<ReplaceCardInput>,
) -> ApiResult<Json<CardView>> {
    Ok(Json(
        cards::update(&state.services, &auth, &slug, req.into()).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<UpdateCardInput>,
) -> ApiResult<Json<CardView>> {
    Ok(Json(cards::update(&state.services, &auth, &slug, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<StatusCode> {
    cards::delete(&state.services, &auth, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
