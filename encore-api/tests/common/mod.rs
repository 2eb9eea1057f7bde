/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for router tests:
/// - A router over a fresh in-memory store
/// - Account registration helpers for each role
/// - JSON request helpers driving the router through `tower::Service`

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use encore_api::app::{build_router, AppState};
use encore_api::config::Config;
use serde_json::{json, Value};
use tower::Service as _;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// A registered account and its bearer token
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Test context containing the router under test
pub struct TestContext {
    pub app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        let state = AppState::new(Config::local(0, TEST_SECRET));
        Self {
            app: build_router(state),
        }
    }

    /// Sends a JSON request and returns the status and decoded body
    ///
    /// Empty bodies decode to `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, account: &Account) -> (StatusCode, Value) {
        self.send("GET", uri, Some(&account.token), None).await
    }

    pub async fn post(&self, uri: &str, account: &Account, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(&account.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, account: &Account, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(&account.token), Some(body)).await
    }

    /// Registers an account with `role` and returns it
    pub async fn register(&self, name: &str, role: &str, profile: Option<Value>) -> Account {
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4());
        let mut body = json!({
            "name": name,
            "email": email,
            "password": "password",
            "role": role,
        });
        if let Some(profile) = profile {
            body["profile"] = profile;
        }

        let (status, value) = self.send("POST", "/api/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", value);

        Account {
            id: value["id"].as_str().unwrap().parse().unwrap(),
            name: name.to_string(),
            email,
            token: value["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn organizer(&self) -> Account {
        self.register("Stage", "ORGANIZER", Some(json!({"type": "Venue"})))
            .await
    }

    pub async fn musician(&self) -> Account {
        self.register("Asha", "MUSICIAN", Some(json!({"genre": "Jazz", "price": 25000})))
            .await
    }

    pub async fn attendee(&self) -> Account {
        self.register("John", "USER", None).await
    }

    /// Sends the "Jazz Night" contract and returns its id
    pub async fn send_contract(&self, organizer: &Account, artist: &Account) -> Uuid {
        let (status, value) = self
            .post(
                "/api/contracts",
                organizer,
                json!({
                    "organizerId": organizer.id,
                    "artistId": artist.id,
                    "eventName": "Jazz Night",
                    "venue": "Blue Room",
                    "eventDate": "2030-05-01",
                    "eventTime": "8:00 PM",
                    "paymentAmount": 50000,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "contract failed: {}", value);
        value["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn respond(&self, artist: &Account, contract_id: Uuid, status: &str) -> (StatusCode, Value) {
        self.put(
            &format!("/api/contracts/{}/status", contract_id),
            artist,
            json!({ "status": status }),
        )
        .await
    }

    pub async fn create_event(
        &self,
        organizer: &Account,
        contract_id: Option<Uuid>,
        total_tickets: u32,
    ) -> (StatusCode, Value) {
        self.post(
            "/api/events",
            organizer,
            json!({
                "name": "Jazz Night",
                "description": "Live quartet",
                "location": "Blue Room",
                "date": "2030-05-01",
                "time": "8:00 PM",
                "price": 800,
                "category": "Jazz",
                "totalTickets": total_tickets,
                "organizerId": organizer.id,
                "contractId": contract_id,
            }),
        )
        .await
    }

    /// Contract sent, accepted, and turned into an event; returns the event id
    pub async fn ready_event(&self, organizer: &Account, artist: &Account, total: u32) -> Uuid {
        let contract_id = self.send_contract(organizer, artist).await;
        let (status, _) = self.respond(artist, contract_id, "ACCEPTED").await;
        assert_eq!(status, StatusCode::OK);

        let (status, value) = self.create_event(organizer, Some(contract_id), total).await;
        assert_eq!(status, StatusCode::CREATED, "event failed: {}", value);
        value["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn book(&self, attendee: &Account, event_id: Uuid, tickets: u32) -> (StatusCode, Value) {
        self.post(
            "/api/bookings",
            attendee,
            json!({ "eventId": event_id, "tickets": tickets }),
        )
        .await
    }
}
