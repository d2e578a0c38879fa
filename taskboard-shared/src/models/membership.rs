/// Membership models and database operations
///
/// Three join tables link users to resources:
///
/// - `board_members`: grants visibility of the whole board subtree; `is_admin`
///   grants authority to administer it
/// - `list_members`, `card_members`: participation only, no authority
///
/// At most one row exists per (resource, user). Revoking sets `is_active` to
/// false and keeps the row as history.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE board_members (
///     id BIGSERIAL PRIMARY KEY,
///     board_id BIGINT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (board_id, user_id)
/// );
/// ```
///
/// `list_members` and `card_members` have the same shape keyed by `list_id`
/// and `card_id`, without `is_admin`.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::membership::BoardMember;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, board_id: i64, user_id: i64) -> Result<(), sqlx::Error> {
/// // Add (or reactivate) a regular member
/// BoardMember::grant(&pool, board_id, user_id, false).await?;
///
/// let member = BoardMember::find(&pool, board_id, user_id).await?;
/// assert!(member.map(|m| m.is_active && !m.is_admin).unwrap_or(false));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::slug::Slug;

const BOARD_MEMBER_COLUMNS: &str = "id, board_id, user_id, is_active, is_admin, joined_at";

/// Board membership row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoardMember {
    pub id: i64,
    pub board_id: i64,
    pub user_id: i64,
    /// Inactive rows grant nothing
    pub is_active: bool,
    /// Admin authority over the board and everything beneath it
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

/// Partial update of a board membership
#[derive(Debug, Clone, Default)]
pub struct UpdateBoardMember {
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

/// Outcome of a guarded membership change
#[derive(Debug, Clone)]
pub enum MemberChange {
    Updated(BoardMember),
    /// The user has never been a member of the board
    NotMember,
    /// The change would leave the board without an active admin
    LastAdmin,
}

/// Resource types that carry participant rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    List,
    Card,
}

impl ParticipantKind {
    fn table(&self) -> &'static str {
        match self {
            ParticipantKind::List => "list_members",
            ParticipantKind::Card => "card_members",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            ParticipantKind::List => "list_id",
            ParticipantKind::Card => "card_id",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantKind::List => "list",
            ParticipantKind::Card => "card",
        }
    }
}

/// List or card participant row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Participant {
    pub id: i64,
    /// List id or card id, depending on the kind
    pub resource_id: i64,
    pub user_id: i64,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

/// Membership joined with the member's public profile
///
/// `is_admin` is `None` for list and card participants.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberListing {
    pub user_slug: Slug,
    pub email: String,
    pub first_name: String,
    pub sur_name: String,
    pub is_active: bool,
    pub is_admin: Option<bool>,
    pub joined_at: DateTime<Utc>,
}

impl BoardMember {
    /// Finds the membership row of `user_id` on `board_id`, active or not
    pub async fn find(
        pool: &PgPool,
        board_id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BoardMember>(&format!(
            "SELECT {BOARD_MEMBER_COLUMNS} FROM board_members
             WHERE board_id = $1 AND user_id = $2"
        ))
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// All members of a board with their profiles, in join order
    pub async fn list_for_board(
        pool: &PgPool,
        board_id: i64,
    ) -> Result<Vec<MemberListing>, sqlx::Error> {
        sqlx::query_as::<_, MemberListing>(
            "SELECT u.slug AS user_slug, u.email, u.first_name, u.sur_name,
                    bm.is_active, bm.is_admin, bm.joined_at
             FROM board_members bm
             JOIN users u ON u.id = bm.user_id
             WHERE bm.board_id = $1
             ORDER BY bm.id",
        )
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    /// Adds a member, or reactivates an existing row
    ///
    /// Granting never lowers an existing admin flag; demotion goes through
    /// [`BoardMember::update`], which guards the last admin.
    pub async fn grant(
        pool: &PgPool,
        board_id: i64,
        user_id: i64,
        is_admin: bool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BoardMember>(&format!(
            "INSERT INTO board_members (board_id, user_id, is_active, is_admin)
             VALUES ($1, $2, TRUE, $3)
             ON CONFLICT (board_id, user_id)
             DO UPDATE SET is_active = TRUE,
                           is_admin = board_members.is_admin OR EXCLUDED.is_admin
             RETURNING {BOARD_MEMBER_COLUMNS}"
        ))
        .bind(board_id)
        .bind(user_id)
        .bind(is_admin)
        .fetch_one(pool)
        .await
    }

    /// Whether `change` would take away this member's active admin authority
    pub fn loses_admin(&self, change: &UpdateBoardMember) -> bool {
        let was_admin = self.is_active && self.is_admin;
        let stays_admin = change.is_active.unwrap_or(self.is_active)
            && change.is_admin.unwrap_or(self.is_admin);
        was_admin && !stays_admin
    }

    /// Changes the active and admin flags of an existing membership
    ///
    /// Runs in one transaction that locks the board's active admin rows, so
    /// concurrent demotions serialize and the board always keeps an admin.
    pub async fn update(
        pool: &PgPool,
        board_id: i64,
        user_id: i64,
        data: UpdateBoardMember,
    ) -> Result<MemberChange, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let admins: Vec<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM board_members
             WHERE board_id = $1 AND is_active AND is_admin
             ORDER BY id
             FOR UPDATE",
        )
        .bind(board_id)
        .fetch_all(&mut *tx)
        .await?;

        let current = sqlx::query_as::<_, BoardMember>(&format!(
            "SELECT {BOARD_MEMBER_COLUMNS} FROM board_members
             WHERE board_id = $1 AND user_id = $2
             FOR UPDATE"
        ))
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(MemberChange::NotMember);
        };
        if current.loses_admin(&data) && admins.len() <= 1 {
            return Ok(MemberChange::LastAdmin);
        }

        let member = sqlx::query_as::<_, BoardMember>(&format!(
            "UPDATE board_members SET
                 is_active = COALESCE($3, is_active),
                 is_admin = COALESCE($4, is_admin)
             WHERE board_id = $1 AND user_id = $2
             RETURNING {BOARD_MEMBER_COLUMNS}"
        ))
        .bind(board_id)
        .bind(user_id)
        .bind(data.is_active)
        .bind(data.is_admin)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(MemberChange::Updated(member))
    }

    /// Number of active admins on a board
    pub async fn count_active_admins(pool: &PgPool, board_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM board_members
             WHERE board_id = $1 AND is_active AND is_admin",
        )
        .bind(board_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

impl Participant {
    pub async fn find(
        pool: &PgPool,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(&format!(
            "SELECT id, {column} AS resource_id, user_id, is_active, joined_at
             FROM {table} WHERE {column} = $1 AND user_id = $2",
            column = kind.column(),
            table = kind.table(),
        ))
        .bind(resource_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// All participants of a list or card with their profiles
    pub async fn list_for(
        pool: &PgPool,
        kind: ParticipantKind,
        resource_id: i64,
    ) -> Result<Vec<MemberListing>, sqlx::Error> {
        sqlx::query_as::<_, MemberListing>(&format!(
            "SELECT u.slug AS user_slug, u.email, u.first_name, u.sur_name,
                    p.is_active, NULL::BOOLEAN AS is_admin, p.joined_at
             FROM {table} p
             JOIN users u ON u.id = p.user_id
             WHERE p.{column} = $1
             ORDER BY p.id",
            column = kind.column(),
            table = kind.table(),
        ))
        .bind(resource_id)
        .fetch_all(pool)
        .await
    }

    /// Adds a participant, or reactivates a revoked one
    pub async fn grant(
        pool: &PgPool,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Participant>(&format!(
            "INSERT INTO {table} ({column}, user_id, is_active)
             VALUES ($1, $2, TRUE)
             ON CONFLICT ({column}, user_id) DO UPDATE SET is_active = TRUE
             RETURNING id, {column} AS resource_id, user_id, is_active, joined_at",
            column = kind.column(),
            table = kind.table(),
        ))
        .bind(resource_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn set_active(
        pool: &PgPool,
        kind: ParticipantKind,
        resource_id: i64,
        user_id: i64,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(&format!(
            "UPDATE {table} SET is_active = $3
             WHERE {column} = $1 AND user_id = $2
             RETURNING id, {column} AS resource_id, user_id, is_active, joined_at",
            column = kind.column(),
            table = kind.table(),
        ))
        .bind(resource_id)
        .bind(user_id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_kind_tables() {
        assert_eq!(ParticipantKind::List.table(), "list_members");
        assert_eq!(ParticipantKind::List.column(), "list_id");
        assert_eq!(ParticipantKind::Card.table(), "card_members");
        assert_eq!(ParticipantKind::Card.column(), "card_id");
    }

    fn member(is_active: bool, is_admin: bool) -> BoardMember {
        BoardMember {
            id: 1,
            board_id: 1,
            user_id: 1,
            is_active,
            is_admin,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn test_loses_admin() {
        let demote = UpdateBoardMember {
            is_active: None,
            is_admin: Some(false),
        };
        let deactivate = UpdateBoardMember {
            is_active: Some(false),
            is_admin: None,
        };

        assert!(member(true, true).loses_admin(&demote));
        assert!(member(true, true).loses_admin(&deactivate));
        assert!(!member(true, true).loses_admin(&UpdateBoardMember::default()));
        assert!(!member(true, false).loses_admin(&deactivate));
        assert!(!member(false, true).loses_admin(&demote));
    }

    #[test]
    fn test_participant_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ParticipantKind::Card).unwrap(),
            "\"card\""
        );
    }
}
