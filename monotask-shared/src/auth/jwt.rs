/// Bearer token issuing and validation
///
/// Tokens are HS256-signed JWTs carrying the user's id and email. They are
/// stateless: nothing is stored server-side, so a token stays valid until it
/// expires.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Lifetime**: 24 hours by default, no leeway on expiry
/// - **Secret**: injected at construction, at least 32 bytes in production
///
/// # Example
///
/// ```
/// use monotask_shared::auth::jwt::TokenService;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new("a-secret-of-at-least-thirty-two-bytes");
///
/// let user_id = Uuid::new_v4();
/// let token = tokens.issue(user_id, "jane@example.com")?;
///
/// let claims = tokens.decode(&token)?;
/// assert_eq!(claims.user_id, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::models::user::User;
use crate::store::UserStore;

/// Default token lifetime in hours
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Token has expired")]
    Expired,

    /// Bad signature, malformed payload or wrong algorithm
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,

    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues and validates tokens with one signing secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
        }
    }

    /// Overrides the token lifetime
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token valid from now
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Issues a token as if it had been created at `issued_at`
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies signature and expiry and returns the payload
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }

    /// Resolves a token to its user
    ///
    /// Any failure (invalid or expired token, unknown user, store error)
    /// yields None: the caller is treated as anonymous.
    pub async fn authenticate(&self, token: &str, users: &dyn UserStore) -> Option<User> {
        let claims = match self.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                return None;
            }
        };

        match users.find_user_by_id(claims.user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                debug!(user_id = %claims.user_id, "Token subject no longer exists");
                None
            }
            Err(e) => {
                debug!(error = %e, "User lookup failed during authentication");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::MemoryStore;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_issue_and_decode() {
        let tokens = TokenService::new(SECRET);
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id, "jane@example.com").unwrap();
        let claims = tokens.decode(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_payload_field_names() {
        let tokens = TokenService::new(SECRET);
        let token = tokens.issue(Uuid::new_v4(), "jane@example.com").unwrap();

        let claims = tokens.decode(&token).unwrap();
        let json = serde_json::to_value(claims).unwrap();
        for field in ["user_id", "email", "iat", "exp"] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_token_accepted_one_hour_after_issue() {
        let tokens = TokenService::new(SECRET);
        let issued = Utc::now() - Duration::hours(1);

        let token = tokens.issue_at(Uuid::new_v4(), "a@b.c", issued).unwrap();
        assert!(tokens.decode(&token).is_ok());
    }

    #[test]
    fn test_token_rejected_after_lifetime() {
        let tokens = TokenService::new(SECRET);
        let issued = Utc::now() - Duration::hours(25);

        let token = tokens.issue_at(Uuid::new_v4(), "a@b.c", issued).unwrap();
        assert!(matches!(tokens.decode(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_custom_lifetime() {
        let tokens = TokenService::new(SECRET).with_lifetime(Duration::minutes(5));
        let issued = Utc::now() - Duration::minutes(10);

        let token = tokens.issue_at(Uuid::new_v4(), "a@b.c", issued).unwrap();
        assert!(matches!(tokens.decode(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenService::new(SECRET).issue(Uuid::new_v4(), "a@b.c").unwrap();
        let other = TokenService::new("another-secret-key-at-least-32-bytes");

        assert!(matches!(other.decode(&token), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = TokenService::new(SECRET);
        assert!(matches!(tokens.decode("not.a.token"), Err(JwtError::Invalid(_))));
        assert!(matches!(tokens.decode(""), Err(JwtError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_authenticate_resolves_user() {
        let store = MemoryStore::new();
        let user = store
            .insert_user(CreateUser {
                email: "jane@example.com".to_string(),
                name: "Jane".to_string(),
                password_hash: "$argon2id$hash".to_string(),
                avatar_url: None,
            })
            .await
            .unwrap();
        let tokens = TokenService::new(SECRET);

        let token = tokens.issue(user.id, &user.email).unwrap();
        let resolved = tokens.authenticate(&token, &store).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_authenticate_is_anonymous_on_any_failure() {
        let store = MemoryStore::new();
        let tokens = TokenService::new(SECRET);

        // Unknown user
        let token = tokens.issue(Uuid::new_v4(), "ghost@example.com").unwrap();
        assert!(tokens.authenticate(&token, &store).await.is_none());

        // Expired
        let expired = tokens
            .issue_at(Uuid::new_v4(), "a@b.c", Utc::now() - Duration::hours(25))
            .unwrap();
        assert!(tokens.authenticate(&expired, &store).await.is_none());

        // Malformed
        assert!(tokens.authenticate("garbage", &store).await.is_none());
    }
}
