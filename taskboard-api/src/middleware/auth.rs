/// Bearer-token authentication
///
/// Resolves `Authorization: Bearer <access token>` into an [`AuthContext`]
/// and stores it in the request extensions, where handlers pick it up with
/// `Extension<AuthContext>`. Requests without a usable token never reach a
/// handler.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use taskboard_shared::auth::context::{bearer_token, AuthContext};
use taskboard_shared::services::accounts;

pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = bearer_token(header_value)
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let auth: AuthContext = accounts::authenticate(&state.services, token).await?;
    tracing::debug!(user = %auth.user_slug, "request authenticated");

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
