/// Authentication utilities
///
/// This module provides the credential primitives used by Encore backends:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing for the API server
/// - [`jwt`]: Bearer token generation and validation
/// - [`digest`]: Salted SHA-256 credential digests for the local fallback store
///
/// # Example
///
/// ```no_run
/// use encore_shared::auth::password::{hash_password, verify_password};
/// use encore_shared::auth::jwt::{create_token, validate_token, Claims};
/// use encore_shared::models::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "asha@example.com", Role::Musician);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// let validated = validate_token(&token, "secret-key-at-least-32-bytes-long!!")?;
/// assert_eq!(validated.role, Role::Musician);
/// # Ok(())
/// # }
/// ```

pub mod digest;
pub mod jwt;
pub mod password;
