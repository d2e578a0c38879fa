/// Opaque external identifiers
///
/// Every persisted entity is exposed to clients only through its slug: 128 bits
/// from the OS random number generator, hex encoded. Internal sequential ids
/// never leave the process.
///
/// A slug is assigned once, at first persistence, and only when the entity has
/// none yet. The database backs this up with a unique constraint per table and
/// a trigger rejecting slug updates.
///
/// # Example
///
/// ```
/// use taskboard_shared::slug::{assign_slug, Slug, Sluggable};
///
/// struct Draft {
///     slug: Option<Slug>,
/// }
///
/// impl Sluggable for Draft {
///     fn slug_mut(&mut self) -> &mut Option<Slug> {
///         &mut self.slug
///     }
/// }
///
/// let mut draft = Draft { slug: None };
/// let first = assign_slug(&mut draft);
/// let second = assign_slug(&mut draft);
/// assert_eq!(first, second);
/// assert_eq!(first.as_str().len(), 32);
/// ```

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes behind a slug
const SLUG_BYTES: usize = 16;

/// Opaque, unguessable external identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Slug(String);

impl Slug {
    /// Generates a fresh random slug (32 lowercase hex characters)
    pub fn generate() -> Self {
        let mut bytes = [0u8; SLUG_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps a slug received from a client or read back from storage
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Slug {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Entities that receive a slug at first persistence
pub trait Sluggable {
    fn slug_mut(&mut self) -> &mut Option<Slug>;
}

/// Assigns a slug if the entity has none, returning the effective slug
///
/// Calling it again on the same entity is a no-op. There is no retry on
/// collision; the store's unique constraint rejects duplicates.
pub fn assign_slug<T: Sluggable>(entity: &mut T) -> Slug {
    entity.slug_mut().get_or_insert_with(Slug::generate).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Draft {
        slug: Option<Slug>,
    }

    impl Sluggable for Draft {
        fn slug_mut(&mut self) -> &mut Option<Slug> {
            &mut self.slug
        }
    }

    #[test]
    fn test_generated_slug_is_lowercase_hex() {
        let slug = Slug::generate();
        assert_eq!(slug.as_str().len(), 32);
        assert!(slug
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_generated_slugs_do_not_repeat() {
        let slugs: HashSet<Slug> = (0..1000).map(|_| Slug::generate()).collect();
        assert_eq!(slugs.len(), 1000);
    }

    #[test]
    fn test_assign_slug_keeps_existing_value() {
        let preset = Slug::new("0123456789abcdef0123456789abcdef");
        let mut draft = Draft {
            slug: Some(preset.clone()),
        };

        assert_eq!(assign_slug(&mut draft), preset);
        assert_eq!(draft.slug, Some(preset));
    }

    #[test]
    fn test_assign_slug_is_idempotent() {
        let mut draft = Draft { slug: None };
        let first = assign_slug(&mut draft);
        let second = assign_slug(&mut draft);
        assert_eq!(first, second);
    }

    #[test]
    fn test_slug_serializes_as_plain_string() {
        let slug = Slug::new("abc");
        assert_eq!(serde_json::to_string(&slug).unwrap(), "\"abc\"");
    }
}
