/// Authenticated caller context
///
/// The JWT layer in [`crate::app`] validates the bearer token and inserts an
/// `AuthContext` into the request extensions. Handlers take it with
/// `Extension<AuthContext>` and resolve the full account through
/// [`AuthContext::user`] when they need more than the id and role.

use encore_shared::{auth::jwt::Claims, models::Role, models::User};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    store::MarketStore,
};

/// Identity of the caller, taken from a validated token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,

    pub email: String,

    pub role: Role,
}

impl AuthContext {
    /// Creates auth context from JWT claims
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }

    /// Loads the caller's account
    ///
    /// A valid token for an account the store does not know (for example
    /// after a server restart) is treated as an expired session.
    pub async fn user(&self, store: &MarketStore) -> ApiResult<User> {
        store
            .user(self.user_id)
            .await
            .ok_or_else(|| ApiError::Unauthorized("Session is no longer valid".to_string()))
    }

    /// Fails unless the caller is `user_id`
    pub fn ensure_self(&self, user_id: Uuid) -> ApiResult<()> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Not authorized to access another user's records".to_string(),
            ))
        }
    }
}
