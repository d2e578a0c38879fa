/// API route handlers
///
/// One module per resource. Handlers are thin: they extract the caller and
/// the input, call the matching service in `taskboard_shared::services`, and
/// pick the status code.
///
/// - `health`: Health check endpoint
/// - `auth`: Accounts and tokens
/// - `boards`, `lists`, `cards`: the hierarchy
/// - `comments`, `attachments`, `tags`: card children
/// - `members`: board membership and list/card participants

pub mod attachments;
pub mod auth;
pub mod boards;
pub mod cards;
pub mod comments;
pub mod health;
pub mod lists;
pub mod members;
pub mod tags;
