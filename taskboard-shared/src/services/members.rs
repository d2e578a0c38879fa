/// Membership management
///
/// Board membership decides visibility and admin authority; list and card
/// participant rows record who works on what. Managing either needs admin
/// authority on the owning board, and a board can never be left without an
/// active admin.
///
/// Memberships are never deleted here. Revoking sets `is_active = false`, and
/// granting again reactivates the existing row.

use serde::Deserialize;

use super::views::MemberView;
use super::ServiceContext;
use crate::auth::authorization::{require_admin, resolve_owning_board, Owner};
use crate::auth::context::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::membership::{MemberChange, ParticipantKind, UpdateBoardMember};
use crate::models::user::User;
use crate::slug::Slug;

/// Identifies the user to add, by slug or by email
///
/// `is_admin` can promote an existing member but never demotes one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrantMemberInput {
    pub user: Option<Slug>,
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMemberInput {
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrantParticipantInput {
    pub user: Option<Slug>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateParticipantInput {
    pub is_active: bool,
}

/// Finds an active user by exactly one of slug or email
async fn target_user(
    ctx: &ServiceContext,
    user: Option<&Slug>,
    email: Option<&str>,
) -> ServiceResult<User> {
    let found = match (user, email.map(str::trim).filter(|e| !e.is_empty())) {
        (Some(slug), None) => ctx.store.user_by_slug(slug).await?,
        (None, Some(email)) => ctx.store.user_by_email(email).await?,
        _ => {
            return Err(ServiceError::invalid(
                "user",
                "Provide either a user slug or an email",
            ))
        }
    };

    found
        .filter(|u| u.is_active)
        .ok_or_else(|| ServiceError::not_found("User"))
}

/// Resolves a list or card through the visible set; returns (id, owner)
async fn participant_resource(
    ctx: &ServiceContext,
    auth: &AuthContext,
    kind: ParticipantKind,
    slug: &Slug,
) -> ServiceResult<(i64, Owner)> {
    let visible = ctx.visible(auth);
    match kind {
        ParticipantKind::List => {
            let list = visible.list(slug).await?;
            Ok((list.id, Owner::List(list.id)))
        }
        ParticipantKind::Card => {
            let card = visible.card(slug).await?;
            Ok((card.id, Owner::Card(card.id)))
        }
    }
}

/// Members of a board the caller belongs to
pub async fn board_members(
    ctx: &ServiceContext,
    auth: &AuthContext,
    board_slug: &Slug,
) -> ServiceResult<Vec<MemberView>> {
    let board = ctx.visible(auth).board(board_slug).await?;
    let members = ctx.store.board_members(board.id).await?;
    Ok(members.into_iter().map(MemberView::from).collect())
}

/// Adds a user to a board, or reactivates a revoked membership
///
/// An existing admin keeps the admin flag; demotion only happens through
/// [`update_board_member`].
pub async fn grant_board_member(
    ctx: &ServiceContext,
    auth: &AuthContext,
    board_slug: &Slug,
    input: GrantMemberInput,
) -> ServiceResult<MemberView> {
    let board = ctx.visible(auth).board(board_slug).await?;
    require_admin(ctx.store(), &board, auth.user_id).await?;

    let user = target_user(ctx, input.user.as_ref(), input.email.as_deref()).await?;
    let member = ctx
        .store
        .grant_board_member(board.id, user.id, input.is_admin)
        .await?;

    tracing::info!(
        board = %board.slug,
        member = %user.slug,
        is_admin = member.is_admin,
        granted_by = %auth.user_slug,
        "board membership granted"
    );

    Ok(MemberView {
        user: user.slug,
        email: user.email,
        first_name: user.first_name,
        sur_name: user.sur_name,
        is_active: member.is_active,
        is_admin: Some(member.is_admin),
        joined_at: member.joined_at,
    })
}

/// Changes a member's active or admin flag
///
/// Rejects any change that would leave the board with no active admin.
pub async fn update_board_member(
    ctx: &ServiceContext,
    auth: &AuthContext,
    board_slug: &Slug,
    user_slug: &Slug,
    input: UpdateMemberInput,
) -> ServiceResult<MemberView> {
    let board = ctx.visible(auth).board(board_slug).await?;
    require_admin(ctx.store(), &board, auth.user_id).await?;

    let user = ctx
        .store
        .user_by_slug(user_slug)
        .await?
        .ok_or_else(|| ServiceError::not_found("Member"))?;

    let change = UpdateBoardMember {
        is_active: input.is_active,
        is_admin: input.is_admin,
    };
    let member = match ctx.store.update_board_member(board.id, user.id, change).await? {
        MemberChange::Updated(member) => member,
        MemberChange::NotMember => return Err(ServiceError::not_found("Member")),
        MemberChange::LastAdmin => {
            return Err(ServiceError::invalid(
                "is_admin",
                "A board must keep at least one active admin",
            ))
        }
    };

    tracing::info!(
        board = %board.slug,
        member = %user.slug,
        is_active = member.is_active,
        is_admin = member.is_admin,
        changed_by = %auth.user_slug,
        "board membership changed"
    );

    Ok(MemberView {
        user: user.slug,
        email: user.email,
        first_name: user.first_name,
        sur_name: user.sur_name,
        is_active: member.is_active,
        is_admin: Some(member.is_admin),
        joined_at: member.joined_at,
    })
}

/// Participants of a visible list or card
pub async fn participants(
    ctx: &ServiceContext,
    auth: &AuthContext,
    kind: ParticipantKind,
    slug: &Slug,
) -> ServiceResult<Vec<MemberView>> {
    let (resource_id, _) = participant_resource(ctx, auth, kind, slug).await?;
    let rows = ctx.store.participants(kind, resource_id).await?;
    Ok(rows.into_iter().map(MemberView::from).collect())
}

/// Adds an active board member as participant of a list or card
pub async fn grant_participant(
    ctx: &ServiceContext,
    auth: &AuthContext,
    kind: ParticipantKind,
    slug: &Slug,
    input: GrantParticipantInput,
) -> ServiceResult<MemberView> {
    let (resource_id, owner) = participant_resource(ctx, auth, kind, slug).await?;
    require_admin(ctx.store(), &owner, auth.user_id).await?;

    let user = target_user(ctx, input.user.as_ref(), input.email.as_deref()).await?;

    let board_id = resolve_owning_board(ctx.store(), &owner)
        .await?
        .ok_or_else(|| ServiceError::not_found("Board"))?;
    let is_board_member = ctx
        .store
        .board_member(board_id, user.id)
        .await?
        .is_some_and(|m| m.is_active);
    if !is_board_member {
        return Err(ServiceError::invalid(
            "user",
            "Participants must be active members of the board",
        ));
    }

    let participant = ctx.store.grant_participant(kind, resource_id, user.id).await?;

    tracing::info!(
        kind = kind.as_str(),
        resource = %slug,
        participant = %user.slug,
        "participant added"
    );

    Ok(MemberView {
        user: user.slug,
        email: user.email,
        first_name: user.first_name,
        sur_name: user.sur_name,
        is_active: participant.is_active,
        is_admin: None,
        joined_at: participant.joined_at,
    })
}

/// Activates or deactivates a participant
pub async fn update_participant(
    ctx: &ServiceContext,
    auth: &AuthContext,
    kind: ParticipantKind,
    slug: &Slug,
    user_slug: &Slug,
    input: UpdateParticipantInput,
) -> ServiceResult<MemberView> {
    let (resource_id, owner) = participant_resource(ctx, auth, kind, slug).await?;
    require_admin(ctx.store(), &owner, auth.user_id).await?;

    let user = ctx
        .store
        .user_by_slug(user_slug)
        .await?
        .ok_or_else(|| ServiceError::not_found("Participant"))?;

    let participant = ctx
        .store
        .set_participant_active(kind, resource_id, user.id, input.is_active)
        .await?
        .ok_or_else(|| ServiceError::not_found("Participant"))?;

    tracing::info!(
        kind = kind.as_str(),
        resource = %slug,
        participant = %user.slug,
        is_active = participant.is_active,
        "participant changed"
    );

    Ok(MemberView {
        user: user.slug,
        email: user.email,
        first_name: user.first_name,
        sur_name: user.sur_name,
        is_active: participant.is_active,
        is_admin: None,
        joined_at: participant.joined_at,
    })
}
