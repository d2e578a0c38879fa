/// Tenant-scoped query layer
///
/// A [`VisibleSet`] is the universe of resources one user may see: everything
/// under a board where the user holds an active membership. Reads always go
/// through it, so a slug outside the caller's boards yields `NotFound`, never
/// `PermissionDenied`.
///
/// Create-time parents are resolved by [`VisibleSet::parent_board`] and
/// friends according to the [`ParentResolution`] policy.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::ListOptions;
/// use taskboard_shared::store::Store;
/// use taskboard_shared::visibility::VisibleSet;
///
/// # async fn example(store: &dyn Store, user_id: i64) -> Result<(), taskboard_shared::error::ServiceError> {
/// let visible = VisibleSet::new(store, user_id);
/// let boards = visible.boards(&ListOptions::default()).await?;
/// for board in boards {
///     let lists = visible
///         .lists(&ListOptions { parent: Some(board.slug.clone()), ..Default::default() })
///         .await?;
///     println!("{}: {} lists", board.name, lists.len());
/// }
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    attachment::Attachment, board::Board, card::Card, comment::Comment, list::List, tag::Tag,
    ListOptions,
};
use crate::slug::Slug;
use crate::store::Store;

/// How the parent named in a create request is looked up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentResolution {
    /// Through the caller's visible set; outsiders get `NotFound`
    #[default]
    Scoped,

    /// Unfiltered lookup followed by an authority check; outsiders get
    /// `PermissionDenied`, which reveals that the slug exists
    Global,
}

impl FromStr for ParentResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scoped" => Ok(ParentResolution::Scoped),
            "global" => Ok(ParentResolution::Global),
            other => Err(format!(
                "unknown parent resolution '{other}', expected 'scoped' or 'global'"
            )),
        }
    }
}

impl fmt::Display for ParentResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentResolution::Scoped => write!(f, "scoped"),
            ParentResolution::Global => write!(f, "global"),
        }
    }
}

/// Resources visible to one user
#[derive(Clone, Copy)]
pub struct VisibleSet<'a> {
    store: &'a dyn Store,
    user_id: i64,
}

impl<'a> VisibleSet<'a> {
    pub fn new(store: &'a dyn Store, user_id: i64) -> Self {
        Self { store, user_id }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub async fn boards(&self, options: &ListOptions) -> ServiceResult<Vec<Board>> {
        Ok(self.store.visible_boards(self.user_id, options).await?)
    }

    pub async fn board(&self, slug: &Slug) -> ServiceResult<Board> {
        self.store
            .visible_board(self.user_id, slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Board"))
    }

    pub async fn lists(&self, options: &ListOptions) -> ServiceResult<Vec<List>> {
        Ok(self.store.visible_lists(self.user_id, options).await?)
    }

    pub async fn list(&self, slug: &Slug) -> ServiceResult<List> {
        self.store
            .visible_list(self.user_id, slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("List"))
    }

    pub async fn cards(&self, options: &ListOptions) -> ServiceResult<Vec<Card>> {
        Ok(self.store.visible_cards(self.user_id, options).await?)
    }

    pub async fn card(&self, slug: &Slug) -> ServiceResult<Card> {
        self.store
            .visible_card(self.user_id, slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Card"))
    }

    pub async fn comments(&self, options: &ListOptions) -> ServiceResult<Vec<Comment>> {
        Ok(self.store.visible_comments(self.user_id, options).await?)
    }

    pub async fn comment(&self, slug: &Slug) -> ServiceResult<Comment> {
        self.store
            .visible_comment(self.user_id, slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment"))
    }

    pub async fn attachments(&self, options: &ListOptions) -> ServiceResult<Vec<Attachment>> {
        Ok(self.store.visible_attachments(self.user_id, options).await?)
    }

    pub async fn attachment(&self, slug: &Slug) -> ServiceResult<Attachment> {
        self.store
            .visible_attachment(self.user_id, slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Attachment"))
    }

    pub async fn tags(&self, options: &ListOptions) -> ServiceResult<Vec<Tag>> {
        Ok(self.store.visible_tags(self.user_id, options).await?)
    }

    pub async fn tag(&self, slug: &Slug) -> ServiceResult<Tag> {
        self.store
            .visible_tag(self.user_id, slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tag"))
    }

    /// Parent board for a new list
    pub async fn parent_board(&self, slug: &Slug, policy: ParentResolution) -> ServiceResult<Board> {
        match policy {
            ParentResolution::Scoped => self.board(slug).await,
            ParentResolution::Global => self
                .store
                .board_by_slug(slug)
                .await?
                .ok_or_else(|| ServiceError::not_found("Board")),
        }
    }

    /// Parent list for a new card
    pub async fn parent_list(&self, slug: &Slug, policy: ParentResolution) -> ServiceResult<List> {
        match policy {
            ParentResolution::Scoped => self.list(slug).await,
            ParentResolution::Global => self
                .store
                .list_by_slug(slug)
                .await?
                .ok_or_else(|| ServiceError::not_found("List")),
        }
    }

    /// Parent card for a new comment, attachment or tag
    pub async fn parent_card(&self, slug: &Slug, policy: ParentResolution) -> ServiceResult<Card> {
        match policy {
            ParentResolution::Scoped => self.card(slug).await,
            ParentResolution::Global => self
                .store
                .card_by_slug(slug)
                .await?
                .ok_or_else(|| ServiceError::not_found("Card")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_resolution_parsing() {
        assert_eq!("scoped".parse::<ParentResolution>().unwrap(), ParentResolution::Scoped);
        assert_eq!(" GLOBAL ".parse::<ParentResolution>().unwrap(), ParentResolution::Global);
        assert!("everyone".parse::<ParentResolution>().is_err());
        assert_eq!(ParentResolution::default(), ParentResolution::Scoped);
        assert_eq!(ParentResolution::Global.to_string(), "global");
    }
}
