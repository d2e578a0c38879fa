/// User model and database operations
///
/// Accounts are identified externally by slug and authenticate by email and
/// password. Emails are unique regardless of case.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     slug VARCHAR(40) NOT NULL UNIQUE,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     first_name VARCHAR(50) NOT NULL,
///     sur_name VARCHAR(50) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
///     registered_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX users_email_lower_key ON users (LOWER(email));
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{CreateUser, User};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     slug: None,
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "Ada".to_string(),
///     sur_name: "Lovelace".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "ADA@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::slug::{assign_slug, Slug, Sluggable};

const USER_COLUMNS: &str =
    "id, slug, email, password_hash, first_name, sur_name, is_active, is_staff, registered_at";

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Internal id, never exposed
    pub id: i64,

    /// External identifier
    pub slug: Slug,

    /// Email address, unique case-insensitively
    pub email: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    pub first_name: String,

    pub sur_name: String,

    /// Inactive users cannot log in or use existing tokens
    pub is_active: bool,

    pub is_staff: bool,

    pub registered_at: DateTime<Utc>,
}

impl User {
    /// "First Last", as shown to other board members
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.sur_name)
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Assigned at insert time when `None`
    pub slug: Option<Slug>,

    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    pub first_name: String,

    pub sur_name: String,
}

impl Sluggable for CreateUser {
    fn slug_mut(&mut self) -> &mut Option<Slug> {
        &mut self.slug
    }
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The email is already registered (unique violation on `users_email_lower_key`)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, mut data: CreateUser) -> Result<Self, sqlx::Error> {
        let slug = assign_slug(&mut data);

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (slug, email, password_hash, first_name, sur_name)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&slug)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.first_name)
        .bind(&data.sur_name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by internal id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &Slug) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email, ignoring case
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskboard_shared::models::user::User;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// if let Some(user) = User::find_by_email(&pool, "ada@example.com").await? {
    ///     println!("Found {}", user.full_name());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let user = User {
            id: 1,
            slug: Slug::generate(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            sur_name: "Lovelace".to_string(),
            is_active: true,
            is_staff: false,
            registered_at: Utc::now(),
        };

        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_create_user_receives_slug_once() {
        let mut data = CreateUser {
            slug: None,
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            sur_name: "Lovelace".to_string(),
        };

        let slug = assign_slug(&mut data);
        assert_eq!(data.slug, Some(slug));
    }
}
