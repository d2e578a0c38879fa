/// Accounts and token lifecycle
///
/// Registration stores an Argon2id hash of the password. Login issues an
/// access token and a refresh token; logout blacklists the refresh token's
/// `jti`. Refresh tokens are not rotated: refreshing returns a new access
/// token and leaves the refresh token usable until it expires or is
/// blacklisted.
///
/// Every credential failure reports the same message, so callers cannot tell
/// an unknown email from a wrong password.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::views::AccountView;
use super::ServiceContext;
use crate::auth::context::AuthContext;
use crate::auth::jwt::{validate_access_token, validate_refresh_token, TokenType};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::CreateUser;

const INVALID_CREDENTIALS: &str = "Invalid credentials.";
const INVALID_TOKEN: &str = "Token is expired or invalid";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 68, message = "Password must be 6 to 68 characters"))]
    pub password: String,

    pub password2: String,

    #[validate(length(min = 1, max = 50, message = "First name must be 1 to 50 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Surname must be 1 to 50 characters"))]
    pub sur_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterOutput {
    pub message: String,
    pub account: AccountView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginOutput {
    pub email: String,
    pub full_name: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenInput {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshOutput {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageOutput {
    pub message: String,
}

impl MessageOutput {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::AuthenticationFailed(INVALID_CREDENTIALS.to_string())
}

fn invalid_token() -> ServiceError {
    ServiceError::AuthenticationFailed(INVALID_TOKEN.to_string())
}

/// Creates an account
pub async fn register(ctx: &ServiceContext, input: RegisterInput) -> ServiceResult<RegisterOutput> {
    input.validate()?;
    if input.password != input.password2 {
        return Err(ServiceError::invalid(
            "password",
            "Password fields did not match.",
        ));
    }

    let password_hash = hash_password(&input.password)?;

    let user = ctx
        .store
        .create_user(CreateUser {
            slug: None,
            email: input.email.trim().to_string(),
            password_hash,
            first_name: input.first_name.trim().to_string(),
            sur_name: input.sur_name.trim().to_string(),
        })
        .await?;

    tracing::info!(user = %user.slug, "account registered");

    Ok(RegisterOutput {
        message: format!(
            "Hi {} {}, your account has been created successfully.",
            user.first_name, user.sur_name
        ),
        account: AccountView::from(&user),
    })
}

/// Exchanges credentials for an access and refresh token pair
pub async fn login(ctx: &ServiceContext, input: LoginInput) -> ServiceResult<LoginOutput> {
    let user = ctx
        .store
        .user_by_email(input.email.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&input.password, &user.password_hash)? {
        tracing::debug!(user = %user.slug, "login rejected: wrong password");
        return Err(invalid_credentials());
    }
    if !user.is_active {
        tracing::debug!(user = %user.slug, "login rejected: inactive account");
        return Err(invalid_credentials());
    }

    let (access_token, _) = ctx.tokens.issue(&user.slug, TokenType::Access)?;
    let (refresh_token, _) = ctx.tokens.issue(&user.slug, TokenType::Refresh)?;

    tracing::info!(user = %user.slug, "login succeeded");

    Ok(LoginOutput {
        full_name: user.full_name(),
        email: user.email,
        access_token,
        refresh_token,
    })
}

/// Blacklists a refresh token; logging out twice is not an error
pub async fn logout(ctx: &ServiceContext, input: RefreshTokenInput) -> ServiceResult<MessageOutput> {
    let claims = validate_refresh_token(&input.refresh_token, &ctx.tokens.secret)?;
    let user = ctx
        .store
        .user_by_slug(&claims.sub)
        .await?
        .ok_or_else(invalid_token)?;

    ctx.store
        .blacklist_token(claims.jti, user.id, claims.expires_at())
        .await?;

    tracing::info!(user = %user.slug, jti = %claims.jti, "refresh token blacklisted");
    Ok(MessageOutput::new("You have been logged out"))
}

/// Issues a new access token from a live refresh token
pub async fn refresh(ctx: &ServiceContext, input: RefreshTokenInput) -> ServiceResult<RefreshOutput> {
    let claims = validate_refresh_token(&input.refresh_token, &ctx.tokens.secret)?;

    if ctx.store.is_token_blacklisted(claims.jti).await? {
        tracing::debug!(jti = %claims.jti, "refresh rejected: token blacklisted");
        return Err(invalid_token());
    }

    let user = ctx
        .store
        .user_by_slug(&claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(invalid_token)?;

    let (access_token, _) = ctx.tokens.issue(&user.slug, TokenType::Access)?;
    Ok(RefreshOutput { access_token })
}

/// Resolves an access token into the caller's [`AuthContext`]
pub async fn authenticate(ctx: &ServiceContext, access_token: &str) -> ServiceResult<AuthContext> {
    let claims = validate_access_token(access_token, &ctx.tokens.secret)?;

    let user = ctx
        .store
        .user_by_slug(&claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(invalid_token)?;

    Ok(AuthContext::from_user(&user))
}

/// Confirms that the caller presented a valid access token
pub fn check_token(_auth: &AuthContext) -> MessageOutput {
    MessageOutput::new("You are authenticated")
}

/// The caller's own account
pub async fn me(ctx: &ServiceContext, auth: &AuthContext) -> ServiceResult<AccountView> {
    let user = ctx
        .store
        .user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;
    Ok(AccountView::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenSettings;
    use crate::blob::MemoryBlobStore;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    fn context() -> ServiceContext {
        ServiceContext::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryBlobStore::new()),
            TokenSettings::new("accounts-test-secret-at-least-32-bytes"),
        )
    }

    fn registration(email: &str) -> RegisterInput {
        RegisterInput {
            email: email.to_string(),
            password: "hunter22".to_string(),
            password2: "hunter22".to_string(),
            first_name: "Ada".to_string(),
            sur_name: "Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let ctx = context();

        let registered = register(&ctx, registration("ada@example.com")).await.unwrap();
        assert_eq!(
            registered.message,
            "Hi Ada Lovelace, your account has been created successfully."
        );

        let login = login(
            &ctx,
            LoginInput {
                email: "ADA@example.com".to_string(),
                password: "hunter22".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(login.full_name, "Ada Lovelace");

        let auth = authenticate(&ctx, &login.access_token).await.unwrap();
        assert_eq!(auth.user_slug, registered.account.slug);
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let ctx = context();
        let mut input = registration("ada@example.com");
        input.password2 = "different".to_string();

        match register(&ctx, input).await {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(errors[0].field, "password");
                assert_eq!(errors[0].message, "Password fields did not match.");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let ctx = context();
        register(&ctx, registration("ada@example.com")).await.unwrap();

        let result = register(&ctx, registration("Ada@Example.com")).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_failures_share_message() {
        let ctx = context();
        register(&ctx, registration("ada@example.com")).await.unwrap();

        for (email, password) in [("ada@example.com", "wrong-pass"), ("nobody@example.com", "hunter22")] {
            let result = login(
                &ctx,
                LoginInput {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await;
            match result {
                Err(ServiceError::AuthenticationFailed(message)) => {
                    assert_eq!(message, "Invalid credentials.")
                }
                other => panic!("expected authentication failure, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_logout_blacklists_refresh_token() {
        let ctx = context();
        register(&ctx, registration("ada@example.com")).await.unwrap();
        let tokens = login(
            &ctx,
            LoginInput {
                email: "ada@example.com".to_string(),
                password: "hunter22".to_string(),
            },
        )
        .await
        .unwrap();

        let input = RefreshTokenInput {
            refresh_token: tokens.refresh_token.clone(),
        };
        assert!(refresh(&ctx, input.clone()).await.is_ok());

        let out = logout(&ctx, input.clone()).await.unwrap();
        assert_eq!(out.message, "You have been logged out");
        // Second logout is idempotent
        assert!(logout(&ctx, input.clone()).await.is_ok());

        let result = refresh(&ctx, input).await;
        assert!(matches!(result, Err(ServiceError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_access_token_rejected_for_refresh() {
        let ctx = context();
        register(&ctx, registration("ada@example.com")).await.unwrap();
        let tokens = login(
            &ctx,
            LoginInput {
                email: "ada@example.com".to_string(),
                password: "hunter22".to_string(),
            },
        )
        .await
        .unwrap();

        let result = refresh(
            &ctx,
            RefreshTokenInput {
                refresh_token: tokens.access_token.clone(),
            },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::AuthenticationFailed(_))));

        assert!(authenticate(&ctx, &tokens.refresh_token).await.is_err());
        assert!(authenticate(&ctx, "not-a-token").await.is_err());
    }
}
