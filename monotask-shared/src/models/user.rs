/// User model and database operations
///
/// This module provides the User model, its outward JSON shape, the avatar
/// bucket rules, and the PostgreSQL queries backing the credential store.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     avatar_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use monotask_shared::models::user::{User, CreateUser};
/// use monotask_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     name: "Jane Doe".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     avatar_url: None,
/// }).await?;
///
/// // Derived from the email until an avatar is picked
/// println!("{}", user.avatar_url());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Base URL of the avatar set
pub const AVATAR_BASE_URL: &str = "https://cdn.jsdelivr.net/gh/alohe/avatars/png";

/// Number of avatars in the set (indices are 1-based)
pub const AVATAR_COUNT: i64 = 35;

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The hash is
/// skipped during serialization so a `User` can never leak it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, stored trimmed and lowercase
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Explicitly chosen avatar URL
    ///
    /// None means the avatar is derived from the email, see [`User::avatar_url`]
    pub avatar_url: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address (already normalized)
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Optional explicit avatar URL
    pub avatar_url: Option<String>,
}

/// Outward representation of a user
///
/// This is the only shape in which users leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url(),
        }
    }
}

/// Normalizes an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Derives the default avatar bucket (1..=35) for an email
///
/// The bucket is the 16-bit checksum of the email's bytes, modulo the number
/// of avatars, shifted to be 1-based.
pub fn default_avatar_index(email: &str) -> i64 {
    let checksum = email.bytes().map(u32::from).sum::<u32>() & 0xFFFF;
    i64::from(checksum) % AVATAR_COUNT + 1
}

/// Returns true if `index` names an avatar in the set
pub fn is_valid_avatar_index(index: i64) -> bool {
    (1..=AVATAR_COUNT).contains(&index)
}

/// Builds the avatar URL for a 1-based index
pub fn avatar_url_for_index(index: i64) -> String {
    format!("{}/memo_{}.png", AVATAR_BASE_URL, index)
}

impl User {
    /// Returns the avatar URL shown to clients
    ///
    /// Falls back to the email-derived bucket when no avatar was chosen.
    pub fn avatar_url(&self) -> String {
        match self.avatar_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => avatar_url_for_index(default_avatar_index(&self.email)),
        }
    }

    /// Converts to the outward JSON shape
    pub fn view(&self) -> UserView {
        UserView::from(self)
    }

    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, avatar_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, password_hash, avatar_url, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.password_hash)
        .bind(data.avatar_url)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, avatar_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by (normalized) email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, avatar_url, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Stores an explicit avatar URL
    ///
    /// # Returns
    ///
    /// The updated user, or None if the user doesn't exist
    pub async fn update_avatar_url(
        pool: &PgPool,
        id: Uuid,
        avatar_url: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET avatar_url = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, password_hash, avatar_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(avatar_url)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}
