/// JWT bearer tokens
///
/// Register and login both return an access token. Clients send it back in
/// `Authorization: Bearer <token>` on every other request.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 24 hours by default
/// - **Validation**: Signature, expiration, not-before and issuer checks
///
/// # Example
///
/// ```
/// use encore_shared::auth::jwt::{create_token, validate_token, Claims};
/// use encore_shared::models::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = Claims::new(user_id, "john@example.com", Role::User);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;

/// Issuer written into and required from every token
pub const ISSUER: &str = "encore";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the caller's
/// email and role, so handlers can authorize without a user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "encore"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    pub email: String,

    pub role: Role,
}

impl Claims {
    /// Default access token lifetime
    pub fn default_expiration() -> Duration {
        Duration::hours(24)
    }

    /// Creates claims with the default expiration
    pub fn new(user_id: Uuid, email: impl Into<String>, role: Role) -> Self {
        Self::with_expiration(user_id, email, role, Self::default_expiration())
    }

    /// Creates claims with a custom expiration
    ///
    /// # Example
    ///
    /// ```
    /// use encore_shared::auth::jwt::Claims;
    /// use encore_shared::models::Role;
    /// use chrono::Duration;
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::with_expiration(
    ///     Uuid::new_v4(),
    ///     "stage@example.com",
    ///     Role::Organizer,
    ///     Duration::hours(1),
    /// );
    /// assert!(!claims.is_expired());
    /// ```
    pub fn with_expiration(
        user_id: Uuid,
        email: impl Into<String>,
        role: Role,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            email: email.into(),
            role,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into an HS256 token
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Verifies the signature, expiration, not-before time and issuer.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "asha@example.com", Role::Musician);

        let token = create_token(&claims, SECRET).expect("Token creation should succeed");
        let validated = validate_token(&token, SECRET).expect("Token should validate");

        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.iss, ISSUER);
        assert_eq!(validated.email, "asha@example.com");
        assert_eq!(validated.role, Role::Musician);
    }

    #[test]
    fn test_default_expiration_is_24_hours() {
        let claims = Claims::new(Uuid::new_v4(), "a@example.com", Role::User);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wrong_secret_fails() {
        let claims = Claims::new(Uuid::new_v4(), "a@example.com", Role::User);
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, "a-different-secret-of-enough-length");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_expired_token_fails() {
        let claims =
            Claims::with_expiration(Uuid::new_v4(), "a@example.com", Role::User, Duration::hours(-2));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_wrong_issuer_fails() {
        let mut claims = Claims::new(Uuid::new_v4(), "a@example.com", Role::User);
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_garbage_token_fails() {
        assert!(validate_token("not.a.token", SECRET).is_err());
    }
}
