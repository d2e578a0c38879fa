/// Authenticated caller
///
/// The HTTP layer resolves a bearer token into an [`AuthContext`] and hands it
/// to every service call. Services use `user_id` for membership checks and
/// never trust anything else from the request to identify the caller.

use serde::Serialize;

use crate::models::user::User;
use crate::slug::Slug;

/// Authentication context added to request extensions
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::context::{bearer_token, AuthContext};
///
/// fn greet(auth: &AuthContext) -> String {
///     format!("User: {}", auth.user_slug)
/// }
///
/// assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// Internal user id; never serialized
    #[serde(skip)]
    pub user_id: i64,

    pub user_slug: Slug,

    pub email: String,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            user_slug: user.slug.clone(),
            email: user.email.clone(),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
///
/// The scheme is matched case-insensitively; an empty token is rejected.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
