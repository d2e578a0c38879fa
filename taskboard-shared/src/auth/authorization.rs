/// Membership and admin authority
///
/// Authority on every resource derives from one place: the caller's
/// `board_members` row on the board at the root of the resource's ownership
/// chain.
///
/// # Permission Model
///
/// 1. **Member**: an active `board_members` row; grants visibility of the
///    whole board subtree
/// 2. **Admin**: an active row with `is_admin`; grants authority to create
///    lists and cards and to update or delete boards, lists and cards
///
/// List and card participant rows never grant authority.
///
/// Every check reads current store state; nothing is cached between calls.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{require_admin, AuthzError};
/// use taskboard_shared::models::card::Card;
/// use taskboard_shared::store::Store;
///
/// async fn archive(store: &dyn Store, card: &Card, user_id: i64) -> Result<(), AuthzError> {
///     // Walks card -> list -> board, then checks the caller's board membership
///     require_admin(store, card, user_id).await?;
///     Ok(())
/// }
/// ```

use crate::models::{
    attachment::Attachment, board::Board, card::Card, comment::Comment, list::List, tag::Tag,
};
use crate::store::{Store, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The caller lacks the required authority tier
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Store failure while walking the ownership chain
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Immediate owner of a resource
///
/// A board is its own owner, which terminates the upward walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Board(i64),
    List(i64),
    Card(i64),
}

/// Resources that sit somewhere under a board
pub trait Owned {
    fn owner(&self) -> Owner;
}

impl Owned for Board {
    fn owner(&self) -> Owner {
        Owner::Board(self.id)
    }
}

impl Owned for List {
    fn owner(&self) -> Owner {
        Owner::Board(self.board_id)
    }
}

impl Owned for Card {
    fn owner(&self) -> Owner {
        Owner::List(self.list_id)
    }
}

impl Owned for Comment {
    fn owner(&self) -> Owner {
        Owner::Card(self.card_id)
    }
}

impl Owned for Attachment {
    fn owner(&self) -> Owner {
        Owner::Card(self.card_id)
    }
}

impl Owned for Tag {
    fn owner(&self) -> Owner {
        Owner::Card(self.card_id)
    }
}

impl Owned for Owner {
    fn owner(&self) -> Owner {
        *self
    }
}

/// Walks up the ownership chain to the root board
///
/// Returns `None` if a link in the chain no longer exists.
pub async fn resolve_owning_board<R>(store: &dyn Store, resource: &R) -> Result<Option<i64>, StoreError>
where
    R: Owned + Sync + ?Sized,
{
    let mut owner = resource.owner();
    loop {
        owner = match owner {
            Owner::Board(board_id) => return Ok(Some(board_id)),
            Owner::List(list_id) => match store.list_by_id(list_id).await? {
                Some(list) => list.owner(),
                None => return Ok(None),
            },
            Owner::Card(card_id) => match store.card_by_id(card_id).await? {
                Some(card) => card.owner(),
                None => return Ok(None),
            },
        };
    }
}

/// True iff the user holds an active membership on the board
pub async fn is_member(store: &dyn Store, board_id: i64, user_id: i64) -> Result<bool, StoreError> {
    Ok(store
        .board_member(board_id, user_id)
        .await?
        .map(|m| m.is_active)
        .unwrap_or(false))
}

/// True iff the user holds an active admin membership on the resource's root board
pub async fn is_admin<R>(store: &dyn Store, resource: &R, user_id: i64) -> Result<bool, StoreError>
where
    R: Owned + Sync + ?Sized,
{
    let Some(board_id) = resolve_owning_board(store, resource).await? else {
        return Ok(false);
    };

    Ok(store
        .board_member(board_id, user_id)
        .await?
        .map(|m| m.is_active && m.is_admin)
        .unwrap_or(false))
}

/// Fails with [`AuthzError::PermissionDenied`] unless the user is a board admin
pub async fn require_admin<R>(store: &dyn Store, resource: &R, user_id: i64) -> Result<(), AuthzError>
where
    R: Owned + Sync + ?Sized,
{
    if !is_admin(store, resource, user_id).await? {
        tracing::debug!(user_id, owner = ?resource.owner(), "admin authority denied");
        return Err(AuthzError::PermissionDenied(
            "Board admin rights are required".to_string(),
        ));
    }

    Ok(())
}

/// Fails with [`AuthzError::PermissionDenied`] unless the user is an active board member
pub async fn require_member(store: &dyn Store, board_id: i64, user_id: i64) -> Result<(), AuthzError> {
    if !is_member(store, board_id, user_id).await? {
        return Err(AuthzError::PermissionDenied(
            "Board membership is required".to_string(),
        ));
    }

    Ok(())
}
