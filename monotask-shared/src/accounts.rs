/// Registration, login and profile updates
///
/// `AccountService` owns the credential rules: emails are normalized before
/// storage and lookup, passwords are hashed with Argon2id, and login failures
/// never reveal whether the email exists.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use monotask_shared::accounts::{AccountError, AccountService};
/// use monotask_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let accounts = AccountService::new(Arc::new(MemoryStore::new()));
///
/// accounts.register("Jane", "Jane@Example.com", "secret").await?;
/// let user = accounts.login("jane@example.com", "secret").await?;
/// assert_eq!(user.email, "jane@example.com");
///
/// let err = accounts.login("jane@example.com", "wrong").await.unwrap_err();
/// assert!(matches!(err, AccountError::InvalidCredentials));
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::models::user::{
    avatar_url_for_index, is_valid_avatar_index, normalize_email, CreateUser, User, AVATAR_COUNT,
};
use crate::store::{StoreError, UserStore};
use crate::validation::{is_blank, FieldError};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The email is already registered
    #[error("Email has already been taken")]
    Conflict,

    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => AccountError::Conflict,
            other => AccountError::Store(other),
        }
    }
}

pub type AccountResult<T> = Result<T, AccountError>;

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Creates an account
    ///
    /// # Errors
    ///
    /// - `Validation` if a field is blank
    /// - `Conflict` if the (normalized) email is taken
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AccountResult<User> {
        let mut errors = Vec::new();
        if is_blank(Some(name)) {
            errors.push(FieldError::blank("name"));
        }
        if is_blank(Some(email)) {
            errors.push(FieldError::blank("email"));
        }
        if password.is_empty() {
            errors.push(FieldError::blank("password"));
        }
        if !errors.is_empty() {
            return Err(AccountError::Validation(errors));
        }

        let email = normalize_email(email);
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AccountError::Conflict);
        }

        let password_hash = hash_password(password)?;

        // A concurrent registration still surfaces as Conflict via the unique index
        let user = self
            .users
            .insert_user(CreateUser {
                email,
                name: name.trim().to_string(),
                password_hash,
                avatar_url: None,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Checks credentials
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> AccountResult<User> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_user_by_email(&email).await? else {
            warn!("Login rejected: unknown email");
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Picks one of the avatars in the set (1-based)
    pub async fn update_avatar(&self, user_id: Uuid, index: i64) -> AccountResult<User> {
        if !is_valid_avatar_index(index) {
            return Err(AccountError::Validation(vec![FieldError::new(
                "avatarIndex",
                format!("must be between 1 and {}", AVATAR_COUNT),
            )]));
        }

        self.users
            .set_avatar_url(user_id, &avatar_url_for_index(index))
            .await?
            .ok_or(AccountError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        Ok(self.users.find_user_by_email(&normalize_email(email)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_hashes_password() {
        let accounts = service();
        let user = accounts
            .register("Jane", "  Jane@Example.COM ", "secret")
            .await
            .unwrap();

        assert_eq!(user.email, "jane@example.com");
        assert_ne!(user.password_hash, "secret");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let store = Arc::new(MemoryStore::new());
        let accounts = AccountService::new(store.clone());
        let first = accounts.register("A", "a@example.com", "pw").await.unwrap();

        let err = accounts
            .register("B", "A@example.com", "other")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Conflict));

        // The original record is untouched
        let stored = store.find_user_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.name, "A");
    }

    #[tokio::test]
    async fn test_register_collects_blank_fields() {
        let err = service().register(" ", "", "").await.unwrap_err();
        let AccountError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "password"]);
    }

    #[tokio::test]
    async fn test_login_errors_are_identical() {
        let accounts = service();
        accounts.register("Jane", "jane@example.com", "secret").await.unwrap();

        let unknown = accounts.login("nobody@example.com", "secret").await.unwrap_err();
        let wrong = accounts.login("jane@example.com", "wrong").await.unwrap_err();

        assert!(matches!(unknown, AccountError::InvalidCredentials));
        assert!(matches!(wrong, AccountError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_login_accepts_any_email_case() {
        let accounts = service();
        accounts.register("Jane", "jane@example.com", "secret").await.unwrap();

        assert!(accounts.login("JANE@example.com ", "secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_avatar_bounds() {
        let accounts = service();
        let user = accounts.register("Jane", "jane@example.com", "pw").await.unwrap();

        for index in [0, 36] {
            assert!(matches!(
                accounts.update_avatar(user.id, index).await,
                Err(AccountError::Validation(_))
            ));
        }

        let first = accounts.update_avatar(user.id, 1).await.unwrap();
        assert!(first.avatar_url().ends_with("/memo_1.png"));

        let last = accounts.update_avatar(user.id, 35).await.unwrap();
        assert!(last.avatar_url().ends_with("/memo_35.png"));
    }

    #[tokio::test]
    async fn test_update_avatar_unknown_user() {
        assert!(matches!(
            service().update_avatar(Uuid::new_v4(), 3).await,
            Err(AccountError::NotFound)
        ));
    }
}
