/// API gateway client
///
/// Maps every REST endpoint to one call over `reqwest`. The bearer token from
/// the [`Session`] is attached to every request except login and register.
///
/// # Error Mapping
///
/// | outcome                          | error                          |
/// |----------------------------------|--------------------------------|
/// | no response                      | `Network` (single attempt)     |
/// | 401 on an authenticated request  | `SessionExpired`, session cleared |
/// | 401 on login                     | `Unauthorized` with message    |
/// | 403                              | `Forbidden` with message       |
/// | 404                              | `NotFound` with message        |
/// | any other error status           | `Server` with message          |
///
/// Messages come from the body's `message` field, then `error`.

use async_trait::async_trait;
use encore_shared::models::{
    AuthResponse, Booking, BookingRequest, Contract, ContractDecision, Event, EventUpdate,
    LinkEvent, LoginRequest, NewContract, NewEvent, RegisterRequest, StatusUpdate, User,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::backend::{Backend, BackendKind};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// Upper bound for the reachability probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of [`ApiClient::test_connection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,

    /// HTTP status of the probe, when one came back
    pub status: Option<u16>,

    pub error: Option<String>,
}

/// REST client for the Encore API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    /// Creates a client with the configured base URL and request timeout
    pub fn new(config: &ClientConfig, session: Session) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks whether the API answers at all
    ///
    /// Posts an empty registration: the server rejects it, and any HTTP status
    /// proves it is up. Only transport failures count as unreachable.
    pub async fn test_connection(&self) -> ConnectionStatus {
        let result = self
            .http
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({}))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) => ConnectionStatus {
                connected: true,
                status: Some(response.status().as_u16()),
                error: None,
            },
            Err(e) if e.is_connect() || e.is_timeout() || e.is_builder() || e.is_request() => {
                ConnectionStatus {
                    connected: false,
                    status: None,
                    error: Some(ClientError::from_transport(&e, &self.base_url).to_string()),
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Probe failed after reaching the server");
                ConnectionStatus {
                    connected: true,
                    status: None,
                    error: None,
                }
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds a request carrying the session's bearer token
    fn authorized(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.session.token().ok_or(ClientError::NotLoggedIn)?;
        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    async fn execute(&self, request: RequestBuilder, authenticated: bool) -> ClientResult<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, api_url = %self.base_url, "Request failed");
            ClientError::from_transport(&e, &self.base_url)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::debug!(status = status.as_u16(), %message, "Request rejected");

        Err(match status {
            StatusCode::UNAUTHORIZED if authenticated => self.session.expire(),
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.authorized(Method::GET, path)?;
        decode(self.execute(request, true).await?).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorized(Method::POST, path)?.json(body);
        decode(self.execute(request, true).await?).await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorized(Method::PUT, path)?.json(body);
        decode(self.execute(request, true).await?).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        let request = self.authorized(Method::DELETE, path)?;
        self.execute(request, true).await?;
        Ok(())
    }

    /// Login and register go out without a token
    async fn post_public<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        decode(self.execute(request, false).await?).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Extracts the user-facing message from an error body
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(key)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            })
        });

    from_json
        .or_else(|| {
            let text = body.trim();
            (!text.is_empty() && text.len() <= 200 && !text.starts_with('<'))
                .then(|| text.to_string())
        })
        .unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => format!("Request failed: {}", reason),
            None => format!("Request failed with status {}", status.as_u16()),
        })
}

#[async_trait]
impl Backend for ApiClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse> {
        self.post_public("/auth/register", request).await
    }

    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        self.post_public("/auth/login", request).await
    }

    async fn artists(&self) -> ClientResult<Vec<User>> {
        self.get("/users/artists").await
    }

    async fn organizers(&self) -> ClientResult<Vec<User>> {
        self.get("/users/organizers").await
    }

    async fn user(&self, id: Uuid) -> ClientResult<User> {
        self.get(&format!("/users/{}", id)).await
    }

    async fn events(&self) -> ClientResult<Vec<Event>> {
        self.get("/events").await
    }

    async fn upcoming_events(&self) -> ClientResult<Vec<Event>> {
        self.get("/events/upcoming").await
    }

    async fn event(&self, id: Uuid) -> ClientResult<Event> {
        self.get(&format!("/events/{}", id)).await
    }

    async fn organizer_events(&self, organizer_id: Uuid) -> ClientResult<Vec<Event>> {
        self.get(&format!("/events/organizer/{}", organizer_id)).await
    }

    async fn create_event(&self, input: &NewEvent) -> ClientResult<Event> {
        self.post("/events", input).await
    }

    async fn update_event(&self, id: Uuid, update: &EventUpdate) -> ClientResult<Event> {
        self.put(&format!("/events/{}", id), update).await
    }

    async fn delete_event(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/events/{}", id)).await
    }

    async fn create_booking(&self, request: &BookingRequest) -> ClientResult<Booking> {
        self.post("/bookings", request).await
    }

    async fn user_bookings(&self, user_id: Uuid) -> ClientResult<Vec<Booking>> {
        self.get(&format!("/bookings/user/{}", user_id)).await
    }

    async fn event_bookings(&self, event_id: Uuid) -> ClientResult<Vec<Booking>> {
        self.get(&format!("/bookings/event/{}", event_id)).await
    }

    async fn booking(&self, id: Uuid) -> ClientResult<Booking> {
        self.get(&format!("/bookings/{}", id)).await
    }

    async fn create_contract(&self, offer: &NewContract) -> ClientResult<Contract> {
        self.post("/contracts", offer).await
    }

    async fn artist_contracts(&self, artist_id: Uuid) -> ClientResult<Vec<Contract>> {
        self.get(&format!("/contracts/artist/{}", artist_id)).await
    }

    async fn organizer_contracts(&self, organizer_id: Uuid) -> ClientResult<Vec<Contract>> {
        self.get(&format!("/contracts/organizer/{}", organizer_id)).await
    }

    async fn pending_contracts(&self, artist_id: Uuid) -> ClientResult<Vec<Contract>> {
        self.get(&format!("/contracts/artist/{}/pending", artist_id)).await
    }

    async fn update_contract_status(
        &self,
        id: Uuid,
        decision: ContractDecision,
    ) -> ClientResult<Contract> {
        self.put(&format!("/contracts/{}/status", id), &StatusUpdate::new(decision))
            .await
    }

    async fn contract(&self, id: Uuid) -> ClientResult<Contract> {
        self.get(&format!("/contracts/{}", id)).await
    }

    async fn link_event_to_contract(
        &self,
        contract_id: Uuid,
        event_id: Uuid,
    ) -> ClientResult<Contract> {
        self.put(
            &format!("/contracts/{}/link-event", contract_id),
            &LinkEvent { event_id },
        )
        .await
    }
}
