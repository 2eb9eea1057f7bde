/// Session state
///
/// A [`Session`] is the one place that knows who is signed in. It is a cheap,
/// cloneable handle: the gateway reads the token from it, the workflow layer
/// reads the user from it, and front ends subscribe to it to react to logins,
/// logouts, and expired tokens.
///
/// The token and user are persisted under the `token` and `user` keys of the
/// key-value store, so a restarted client picks up where it left off.
///
/// # Example
///
/// ```
/// use encore_client::session::Session;
/// use encore_client::storage::MemoryStore;
/// use encore_shared::models::{Profile, User};
/// use uuid::Uuid;
///
/// # fn example() -> anyhow::Result<()> {
/// let session = Session::restore(MemoryStore::shared())?;
/// let mut changes = session.subscribe();
///
/// let user = User {
///     id: Uuid::new_v4(),
///     name: "John".to_string(),
///     email: "john@example.com".to_string(),
///     profile: Profile::Attendee,
///     created_at: None,
/// };
/// session.sign_in("token".to_string(), user)?;
///
/// assert!(changes.has_changed()?);
/// assert_eq!(changes.borrow_and_update().as_ref().map(|s| s.user.name.as_str()), Some("John"));
/// # Ok(())
/// # }
/// ```

use encore_shared::models::User;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::ClientError;
use crate::storage::{self, SharedStore, StorageError, TOKEN_KEY, USER_KEY};

/// Signed-in identity
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub token: String,
    pub user: User,
}

#[derive(Debug)]
struct SessionInner {
    store: SharedStore,
    state: watch::Sender<Option<SessionState>>,
}

/// Shared session handle
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Loads the persisted session, if any
    ///
    /// A token without a user (or the reverse) is treated as signed out.
    pub fn restore(store: SharedStore) -> Result<Self, StorageError> {
        let token: Option<String> = storage::read_json(store.as_ref(), TOKEN_KEY)?;
        let user: Option<User> = storage::read_json(store.as_ref(), USER_KEY)?;

        let state = match (token, user) {
            (Some(token), Some(user)) => {
                tracing::debug!(user_id = %user.id, "Session restored");
                Some(SessionState { token, user })
            }
            _ => None,
        };

        let (sender, _) = watch::channel(state);
        Ok(Self {
            inner: Arc::new(SessionInner {
                store,
                state: sender,
            }),
        })
    }

    /// Persists and broadcasts a new signed-in identity
    pub fn sign_in(&self, token: String, user: User) -> Result<(), StorageError> {
        let store = self.inner.store.as_ref();
        storage::write_json(store, TOKEN_KEY, &token)?;
        storage::write_json(store, USER_KEY, &user)?;

        tracing::info!(user_id = %user.id, role = %user.role(), "Signed in");
        self.inner.state.send_replace(Some(SessionState { token, user }));
        Ok(())
    }

    /// Forgets the signed-in identity
    pub fn clear(&self) -> Result<(), StorageError> {
        let store = self.inner.store.as_ref();
        store.remove(TOKEN_KEY)?;
        store.remove(USER_KEY)?;

        if self.inner.state.send_replace(None).is_some() {
            tracing::info!("Signed out");
        }
        Ok(())
    }

    /// Clears the session after the server rejected its token
    ///
    /// Always returns [`ClientError::SessionExpired`] so callers can write
    /// `return Err(session.expire())`.
    pub fn expire(&self) -> ClientError {
        tracing::warn!("Session token rejected by server");
        if let Err(e) = self.clear() {
            tracing::error!(error = %e, "Failed to clear expired session");
        }
        ClientError::SessionExpired
    }

    pub fn current(&self) -> Option<SessionState> {
        self.inner.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().as_ref().map(|s| s.user.clone())
    }

    /// The signed-in user, or [`ClientError::NotLoggedIn`]
    pub fn require_user(&self) -> Result<User, ClientError> {
        self.user().ok_or(ClientError::NotLoggedIn)
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.state.borrow().is_some()
    }

    /// Receiver that observes every sign-in and sign-out
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionState>> {
        self.inner.state.subscribe()
    }
}
