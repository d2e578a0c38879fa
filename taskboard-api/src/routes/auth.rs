/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create an account
/// - `POST /v1/auth/login` - Exchange credentials for tokens
/// - `POST /v1/auth/logout` - Blacklist a refresh token
/// - `POST /v1/auth/refresh` - New access token from a refresh token
/// - `GET /v1/auth/check_token` - Confirm an access token (authenticated)
/// - `GET /v1/auth/me` - The caller's account (authenticated)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::AppJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use taskboard_shared::auth::context::AuthContext;
use taskboard_shared::services::accounts::{
    self, LoginInput, LoginOutput, MessageOutput, RefreshOutput, RefreshTokenInput, RegisterInput,
};
use taskboard_shared::services::views::AccountView;

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "hunter22",
///   "password2": "hunter22",
///   "first_name": "Ada",
///   "sur_name": "Lovelace"
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// { "message": "Hi Ada Lovelace, your account has been created successfully." }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterInput>,
) -> ApiResult<(StatusCode, Json<MessageOutput>)> {
    let registered = accounts::register(&state.services, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageOutput {
            message: registered.message,
        }),
    ))
}

/// Login with email and password
///
/// # Response
///
/// ```json
/// {
///   "email": "ada@example.com",
///   "full_name": "Ada Lovelace",
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: `"Invalid credentials."`
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginInput>,
) -> ApiResult<Json<LoginOutput>> {
    Ok(Json(accounts::login(&state.services, req).await?))
}

/// Blacklist a refresh token
///
/// ```text
/// POST /v1/auth/logout
/// { "refresh_token": "eyJ..." }
/// ```
pub async fn logout(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshTokenInput>,
) -> ApiResult<Json<MessageOutput>> {
    Ok(Json(accounts::logout(&state.services, req).await?))
}

/// Refresh access token
///
/// The refresh token itself is not rotated.
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshTokenInput>,
) -> ApiResult<Json<RefreshOutput>> {
    Ok(Json(accounts::refresh(&state.services, req).await?))
}

pub async fn check_token(Extension(auth): Extension<AuthContext>) -> Json<MessageOutput> {
    Json(accounts::check_token(&auth))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<AccountView>> {
    Ok(Json(accounts::me(&state.services, &auth).await?))
}
