/// Membership endpoints
///
/// Board members:
/// - `GET /v1/boards/:slug/members`
/// - `POST /v1/boards/:slug/members` - `{"user": "<slug>"}` or `{"email": "..."}`, plus `is_admin`
/// - `PATCH /v1/boards/:slug/members/:user` - `is_active` and/or `is_admin`
///
/// List and card participants follow the same shape under `/v1/lists/:slug`
/// and `/v1/cards/:slug`, without the admin flag.

use crate::{app::AppState, error::ApiResult, extract::AppJson};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskboard_shared::auth::context::AuthContext;
use taskboard_shared::models::membership::ParticipantKind;
use taskboard_shared::services::members::{
    self, GrantMemberInput, GrantParticipantInput, UpdateMemberInput, UpdateParticipantInput,
};
use taskboard_shared::services::views::MemberView;
use taskboard_shared::slug::Slug;

pub async fn list_board_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Json<Vec<MemberView>>> {
    Ok(Json(members::board_members(&state.services, &auth, &slug).await?))
}

/// Add a member to a board
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin of the board
/// - `404 Not Found`: board not visible, or no active user matches
/// - `422 Unprocessable Entity`: neither or both of `user` and `email` given
pub async fn grant_board_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<GrantMemberInput>,
) -> ApiResult<(StatusCode, Json<MemberView>)> {
    let member = members::grant_board_member(&state.services, &auth, &slug, req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Change a member's flags
///
/// Demoting or deactivating the last active admin is rejected with `422`.
pub async fn update_board_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((slug, user)): Path<(Slug, Slug)>,
    AppJson(req): AppJson<UpdateMemberInput>,
) -> ApiResult<Json<MemberView>> {
    Ok(Json(
        members::update_board_member(&state.services, &auth, &slug, &user, req).await?,
    ))
}

async fn list_participants(
    state: AppState,
    auth: AuthContext,
    kind: ParticipantKind,
    slug: Slug,
) -> ApiResult<Json<Vec<MemberView>>> {
    Ok(Json(
        members::participants(&state.services, &auth, kind, &slug).await?,
    ))
}

async fn grant_participant(
    state: AppState,
    auth: AuthContext,
    kind: ParticipantKind,
    slug: Slug,
    req: GrantParticipantInput,
) -> ApiResult<(StatusCode, Json<MemberView>)> {
    let participant =
        members::grant_participant(&state.services, &auth, kind, &slug, req).await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

async fn update_participant(
    state: AppState,
    auth: AuthContext,
    kind: ParticipantKind,
    (slug, user): (Slug, Slug),
    req: UpdateParticipantInput,
) -> ApiResult<Json<MemberView>> {
    Ok(Json(
        members::update_participant(&state.services, &auth, kind, &slug, &user, req).await?,
    ))
}

pub async fn list_list_participants(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Json<Vec<MemberView>>> {
    list_participants(state, auth, ParticipantKind::List, slug).await
}

pub async fn grant_list_participant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<GrantParticipantInput>,
) -> ApiResult<(StatusCode, Json<MemberView>)> {
    grant_participant(state, auth, ParticipantKind::List, slug, req).await
}

pub async fn update_list_participant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(path): Path<(Slug, Slug)>,
    AppJson(req): AppJson<UpdateParticipantInput>,
) -> ApiResult<Json<MemberView>> {
    update_participant(state, auth, ParticipantKind::List, path, req).await
}

pub async fn list_card_participants(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
) -> ApiResult<Json<Vec<MemberView>>> {
    list_participants(state, auth, ParticipantKind::Card, slug).await
}

pub async fn grant_card_participant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<Slug>,
    AppJson(req): AppJson<GrantParticipantInput>,
) -> ApiResult<(StatusCode, Json<MemberView>)> {
    grant_participant(state, auth, ParticipantKind::Card, slug, req).await
}

pub async fn update_card_participant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(path): Path<(Slug, Slug)>,
    AppJson(req): AppJson<UpdateParticipantInput>,
) -> ApiResult<Json<MemberView>> {
    update_participant(state, auth, ParticipantKind::Card, path, req).await
}
