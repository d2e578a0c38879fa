/// Database models for Taskboard
///
/// Each model owns its SQL: the structs map rows with `sqlx::FromRow` and the
/// associated functions run runtime-checked queries against a `PgPool`.
///
/// # Models
///
/// - `user`: accounts
/// - `board`, `list`, `card`: the tenant hierarchy
/// - `comment`, `attachment`, `tag`: card children
/// - `membership`: board members and list/card participants
/// - `token`: refresh-token blacklist
///
/// Queries named `*_visible` only return rows reachable from a board where the
/// caller holds an active membership.

pub mod attachment;
pub mod board;
pub mod card;
pub mod comment;
pub mod list;
pub mod membership;
pub mod tag;
pub mod token;
pub mod user;

use crate::slug::Slug;

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Upper bound on page size for listings
pub const MAX_PAGE_SIZE: i64 = 200;

/// Filtering and pagination for visible-set listings
///
/// Results are always ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Restrict to children of this parent (board for lists, list for cards,
    /// card for comments, attachments and tags). Ignored for boards.
    pub parent: Option<Slug>,

    /// Include rows whose `is_active` flag is off
    pub include_inactive: bool,

    /// Requested page size, clamped to `1..=MAX_PAGE_SIZE`
    pub limit: Option<i64>,

    /// Rows to skip, negative values count as zero
    pub offset: Option<i64>,
}

impl ListOptions {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn parent_slug(&self) -> Option<&str> {
        self.parent.as_ref().map(Slug::as_str)
    }
}
