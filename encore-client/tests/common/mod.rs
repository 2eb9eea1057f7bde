/// Common test utilities for client end-to-end tests
///
/// Starts the reference backend on an ephemeral port and builds marketplaces
/// pointed at it, each with its own in-memory session.

use encore_api::app::{build_router, AppState};
use encore_api::config::Config;
use encore_client::backend::Backend;
use encore_client::config::ClientConfig;
use encore_client::gateway::ApiClient;
use encore_client::session::Session;
use encore_client::storage::{MemoryStore, SharedStore};
use encore_client::workflow::Marketplace;
use encore_shared::models::{
    ContractTerms, EventDetails, MusicianProfile, OrganizerProfile, Profile, RegisterRequest, User,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// A running backend, stopped on drop
pub struct TestServer {
    pub api_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let app = build_router(AppState::new(Config::local(0, TEST_SECRET)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            api_url: format!("http://{}/api", address),
            handle,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            offline_fallback: false,
            ..ClientConfig::for_api(self.api_url.clone())
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One front end: its own store, session and gateway
pub struct TestClient {
    pub market: Marketplace,
    pub api: Arc<ApiClient>,
    pub session: Session,
    pub store: SharedStore,
}

impl TestClient {
    pub fn new(server: &TestServer) -> Self {
        let store = MemoryStore::shared();
        let session = Session::restore(store.clone()).unwrap();
        let api = Arc::new(ApiClient::new(&server.config(), session.clone()).unwrap());
        let backend: Arc<dyn Backend> = api.clone();

        Self {
            market: Marketplace::new(backend, session.clone()),
            api,
            session,
            store,
        }
    }

    pub async fn register(&self, name: &str, profile: Profile) -> User {
        let email = format!("{}-{}@example.com", name.to_lowercase(), uuid::Uuid::new_v4());
        self.market
            .register(RegisterRequest::new(name, email, "password", &profile))
            .await
            .unwrap()
    }

    pub async fn organizer(&self) -> User {
        self.register(
            "Stage",
            Profile::Organizer(OrganizerProfile {
                kind: Some("Venue".to_string()),
                ..Default::default()
            }),
        )
        .await
    }

    pub async fn musician(&self) -> User {
        self.register(
            "Asha",
            Profile::Musician(MusicianProfile {
                genre: Some("Jazz".to_string()),
                price: Some(25000.0),
                ..Default::default()
            }),
        )
        .await
    }

    pub async fn attendee(&self) -> User {
        self.register("John", Profile::Attendee).await
    }

    pub async fn login(&self, user: &User) -> User {
        self.market.login(&user.email, "password").await.unwrap()
    }
}

pub fn jazz_terms() -> ContractTerms {
    ContractTerms {
        event_name: "Jazz Night".to_string(),
        venue: "Blue Room".to_string(),
        event_date: chrono::NaiveDate::from_ymd_opt(2030, 5, 1),
        event_time: Some("8:00 PM".to_string()),
        payment_amount: 50000.0,
        ..Default::default()
    }
}

pub fn jazz_details(total_tickets: u32) -> EventDetails {
    EventDetails {
        name: "Jazz Night".to_string(),
        description: "Live quartet".to_string(),
        location: "Blue Room".to_string(),
        date: chrono::NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
        time: "8:00 PM".to_string(),
        price: 800.0,
        category: "Jazz".to_string(),
        total_tickets,
    }
}
