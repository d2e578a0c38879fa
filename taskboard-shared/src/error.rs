/// Service error taxonomy
///
/// Every service operation returns [`ServiceResult`]. Lower-layer errors
/// convert into [`ServiceError`] with `?`; the HTTP layer maps each variant to
/// one status code.
///
/// | Variant | Meaning |
/// |---|---|
/// | `NotFound` | slug does not resolve within the caller's scope |
/// | `PermissionDenied` | resolves, but the caller lacks the authority tier |
/// | `Validation` | malformed or constraint-violating field input |
/// | `AuthenticationFailed` | bad credentials or a bad, expired or blacklisted token |
/// | `Conflict` | unique constraint violated |
/// | `Internal` | unexpected persistence or blob failure |

use serde::{Deserialize, Serialize};

use crate::auth::{authorization::AuthzError, jwt::JwtError, password::PasswordError};
use crate::blob::BlobError;
use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Details are for logs only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// `NotFound` naming the resource kind, e.g. `"Board not found"`
    pub fn not_found(kind: &str) -> Self {
        ServiceError::NotFound(format!("{kind} not found"))
    }

    /// A single-field validation failure
    pub fn invalid(field: &str, message: &str) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }
}

/// Human message for a unique constraint, keyed by constraint name
fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        "users_email_lower_key" => "A user with this email already exists",
        "card_tags_card_id_label_key" => "This card already has a tag with that label",
        _ => "Resource already exists",
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                ServiceError::Conflict(conflict_message(&constraint).to_string())
            }
            // The parent vanished between lookup and insert
            StoreError::MissingReference(_) => {
                ServiceError::NotFound("Referenced resource not found".to_string())
            }
            StoreError::Database(e) => ServiceError::Internal(format!("Database error: {}", e)),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::PermissionDenied(message) => ServiceError::PermissionDenied(message),
            AuthzError::Store(e) => e.into(),
        }
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(message) => ServiceError::Internal(message),
            _ => ServiceError::AuthenticationFailed("Token is expired or invalid".to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<BlobError> for ServiceError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound(_) => ServiceError::not_found("Attachment content"),
            e => ServiceError::Internal(format!("Blob store error: {}", e)),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ServiceError::Validation(fields)
    }
}
