/// Request extractors that reject with [`ApiError`]
///
/// Axum's own `Json` and `Query` reject with plain-text bodies; these wrap
/// them so malformed input gets the same JSON error shape as everything else.

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;
use taskboard_shared::models::ListOptions;
use taskboard_shared::slug::Slug;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// `?parent=&include_inactive=&limit=&offset=` on listing endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub parent: Option<Slug>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListQuery> for ListOptions {
    fn from(query: ListQuery) -> Self {
        ListOptions {
            parent: query.parent,
            include_inactive: query.include_inactive,
            limit: query.limit,
            offset: query.offset,
        }
    }
}
