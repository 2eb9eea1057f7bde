/// Client error types
///
/// Every failure a front end has to show falls into one of these buckets:
///
/// - **Validation**: bad input, caught before any request is sent
/// - **Forbidden**: the signed-in role may not do this
/// - **Network**: the server never answered (single attempt, no retry)
/// - **Server**: the server refused with a message, shown as-is
/// - **SessionExpired**: the server rejected the token; the session is cleared
///
/// None of them is fatal: the caller shows the message and lets the user retry.

use encore_shared::WorkflowError;

use crate::storage::StorageError;

/// Client result type alias
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid input caught locally
    #[error("{0}")]
    Validation(String),

    /// Role or ownership does not allow the action
    #[error("{0}")]
    Forbidden(String),

    /// Entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Workflow rule violated (sold out, contract already answered, ...)
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Bad credentials on login
    #[error("{0}")]
    Unauthorized(String),

    /// No one is signed in
    #[error("Please login to continue")]
    NotLoggedIn,

    /// The server no longer accepts the stored token
    #[error("Your session has expired. Please login again.")]
    SessionExpired,

    /// No response from the server
    #[error("{0}")]
    Network(String),

    /// Any other error status, with the server's message
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Whether the server could not be reached at all
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// Whether the user has to sign in (again) before retrying
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::NotLoggedIn | ClientError::SessionExpired)
    }

    /// Maps a transport failure to a user-facing network error
    pub fn from_transport(error: &reqwest::Error, base_url: &str) -> Self {
        if error.is_connect() {
            ClientError::Network(format!(
                "Cannot connect to server. Please ensure the backend is running on {}.",
                base_url
            ))
        } else if error.is_timeout() {
            ClientError::Network(
                "The server took too long to respond. Please try again.".to_string(),
            )
        } else if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Network(
                "Network error. Please check if the backend server is running.".to_string(),
            )
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        match WorkflowError::from(errors) {
            WorkflowError::Validation(message) => ClientError::Validation(message),
            other => ClientError::Workflow(other),
        }
    }
}
