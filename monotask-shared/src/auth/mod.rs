/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Bearer token issuing, validation and identity resolution
///
/// # Example
///
/// ```no_run
/// use monotask_shared::auth::password::{hash_password, verify_password};
/// use monotask_shared::auth::jwt::TokenService;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("demo123")?;
/// assert!(verify_password("demo123", &hash)?);
///
/// let tokens = TokenService::new("a-secret-of-at-least-thirty-two-bytes");
/// let token = tokens.issue(Uuid::new_v4(), "demo@example.com")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
