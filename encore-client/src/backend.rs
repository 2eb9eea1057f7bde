/// Backend abstraction
///
/// The workflow layer talks to a [`Backend`] and never cares which one it
/// got: the REST API through [`ApiClient`](crate::gateway::ApiClient), or the
/// [`LocalStore`](crate::local::LocalStore) fallback when the API cannot be
/// reached. Both enforce the same rules from `encore_shared::workflow`.
///
/// # Selection
///
/// ```text
/// connect()
///   ├─> probe the API (any HTTP response counts as reachable)
///   ├─> reachable          → ApiClient
///   ├─> unreachable + fallback enabled  → LocalStore
///   └─> unreachable + fallback disabled → ApiClient (calls report network errors)
/// ```

use async_trait::async_trait;
use encore_shared::models::{
    AuthResponse, Booking, BookingRequest, Contract, ContractDecision, Event, EventUpdate,
    LoginRequest, NewContract, NewEvent, RegisterRequest, User,
};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::gateway::ApiClient;
use crate::local::LocalStore;
use crate::session::Session;
use crate::storage::SharedStore;

/// Which kind of backend is serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Remote,
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Remote => write!(f, "remote"),
            BackendKind::Local => write!(f, "local"),
        }
    }
}

/// Every marketplace operation a front end needs
///
/// Calls that act on behalf of someone (creating, booking, answering) use the
/// identity held by the backend's [`Session`].
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    fn kind(&self) -> BackendKind;

    // ---- auth ----

    async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse>;

    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse>;

    // ---- users ----

    async fn artists(&self) -> ClientResult<Vec<User>>;

    async fn organizers(&self) -> ClientResult<Vec<User>>;

    async fn user(&self, id: Uuid) -> ClientResult<User>;

    // ---- events ----

    async fn events(&self) -> ClientResult<Vec<Event>>;

    async fn upcoming_events(&self) -> ClientResult<Vec<Event>>;

    async fn event(&self, id: Uuid) -> ClientResult<Event>;

    async fn organizer_events(&self, organizer_id: Uuid) -> ClientResult<Vec<Event>>;

    async fn create_event(&self, input: &NewEvent) -> ClientResult<Event>;

    async fn update_event(&self, id: Uuid, update: &EventUpdate) -> ClientResult<Event>;

    async fn delete_event(&self, id: Uuid) -> ClientResult<()>;

    // ---- bookings ----

    async fn create_booking(&self, request: &BookingRequest) -> ClientResult<Booking>;

    async fn user_bookings(&self, user_id: Uuid) -> ClientResult<Vec<Booking>>;

    async fn event_bookings(&self, event_id: Uuid) -> ClientResult<Vec<Booking>>;

    async fn booking(&self, id: Uuid) -> ClientResult<Booking>;

    // ---- contracts ----

    async fn create_contract(&self, offer: &NewContract) -> ClientResult<Contract>;

    async fn artist_contracts(&self, artist_id: Uuid) -> ClientResult<Vec<Contract>>;

    async fn organizer_contracts(&self, organizer_id: Uuid) -> ClientResult<Vec<Contract>>;

    async fn pending_contracts(&self, artist_id: Uuid) -> ClientResult<Vec<Contract>>;

    async fn update_contract_status(
        &self,
        id: Uuid,
        decision: ContractDecision,
    ) -> ClientResult<Contract>;

    async fn contract(&self, id: Uuid) -> ClientResult<Contract>;

    async fn link_event_to_contract(&self, contract_id: Uuid, event_id: Uuid)
        -> ClientResult<Contract>;
}

/// Picks the backend for this run
///
/// The session and the fallback data share `store`.
pub async fn connect(
    config: &ClientConfig,
    store: SharedStore,
    session: Session,
) -> ClientResult<Arc<dyn Backend>> {
    let api = ApiClient::new(config, session.clone())?;
    let probe = api.test_connection().await;

    if probe.connected {
        tracing::debug!(api_url = %config.base_url(), status = ?probe.status, "API reachable");
        return Ok(Arc::new(api));
    }

    if !config.offline_fallback {
        tracing::warn!(
            api_url = %config.base_url(),
            error = ?probe.error,
            "API unreachable and offline fallback disabled"
        );
        return Ok(Arc::new(api));
    }

    tracing::warn!(
        api_url = %config.base_url(),
        error = ?probe.error,
        "API unreachable, using local fallback store"
    );
    Ok(Arc::new(LocalStore::open(store, session)?))
}
