/// Local fallback store
///
/// A stand-in backend for when the API cannot be reached. It keeps users,
/// events, bookings and contracts as JSON arrays in the key-value store and
/// runs the same `encore_shared::workflow` checks the server runs, so the
/// contract → event → booking rules hold offline too.
///
/// # Differences from the Server
///
/// - Passwords are stored as salted SHA-256 digests, not Argon2 hashes
/// - Tokens are opaque `local-…` strings with no expiry
/// - Mutations are serialized within one process only; two processes sharing
///   a data directory can still race
///
/// # Seed Data
///
/// On first use the store is seeded with two demo accounts per role (password
/// `password`) and two demo events:
///
/// | email                   | role      |
/// |-------------------------|-----------|
/// | `user@example.com`      | attendee  |
/// | `user2@example.com`     | attendee  |
/// | `organizer@example.com` | organizer |
/// | `organizer2@example.com`| organizer |
/// | `musician@example.com`  | musician  |
/// | `musician2@example.com` | musician  |

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use encore_shared::auth::digest::{digest_password, random_token, verify_digest};
use encore_shared::models::{
    AuthResponse, Booking, BookingRequest, Contract, ContractDecision, ContractStatus, Event,
    EventDetails, EventUpdate, LoginRequest, MusicianProfile, NewContract, NewEvent,
    OrganizerProfile, Profile, RegisterRequest, Role, User,
};
use encore_shared::workflow;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;
use validator::Validate;

use crate::backend::{Backend, BackendKind};
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::storage::{
    self, SharedStore, StorageError, BOOKINGS_KEY, CONTRACTS_KEY, EVENTS_KEY, USERS_KEY,
};

/// Password of every seeded account
pub const DEMO_PASSWORD: &str = "password";

/// Prefix of tokens issued by the local store
const TOKEN_PREFIX: &str = "local-";

/// A user with their password digest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(flatten)]
    user: User,

    /// `salt$sha256` digest
    password_digest: String,
}

/// Fallback backend over a key-value store
#[derive(Debug)]
pub struct LocalStore {
    store: SharedStore,
    session: Session,
    write_lock: Mutex<()>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn not_found(entity: &str, id: Uuid) -> ClientError {
    ClientError::NotFound(format!("{} {} not found", entity, id))
}

impl LocalStore {
    /// Opens the store, seeding demo data on first use
    pub fn open(store: SharedStore, session: Session) -> Result<Self, StorageError> {
        let local = Self {
            store,
            session,
            write_lock: Mutex::new(()),
        };
        local.seed()?;
        Ok(local)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        Ok(storage::read_json(self.store.as_ref(), key)?.unwrap_or_default())
    }

    fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StorageError> {
        storage::write_json(self.store.as_ref(), key, items)
    }

    /// Saves `items` under `key`, then `then_items` under `then_key`. If the
    /// second write fails, `key` is put back to `previous` before the error
    /// is returned.
    fn save_linked<A: Serialize, B: Serialize>(
        &self,
        key: &str,
        items: &[A],
        previous: &[A],
        then_key: &str,
        then_items: &[B],
    ) -> Result<(), StorageError> {
        self.save(key, items)?;
        if let Err(e) = self.save(then_key, then_items) {
            if let Err(rollback) = self.save(key, previous) {
                tracing::error!(key, error = %rollback, "Failed to roll back local write");
            }
            return Err(e);
        }
        Ok(())
    }

    fn users(&self) -> Result<Vec<StoredUser>, StorageError> {
        self.load(USERS_KEY)
    }

    fn events_sorted(&self, pred: impl Fn(&Event) -> bool) -> ClientResult<Vec<Event>> {
        let mut events: Vec<Event> = self.load(EVENTS_KEY)?;
        events.retain(|e| pred(e));
        events.sort_by(|a, b| (a.date, &a.name).cmp(&(b.date, &b.name)));
        Ok(events)
    }

    fn contracts_sorted(&self, pred: impl Fn(&Contract) -> bool) -> ClientResult<Vec<Contract>> {
        let mut contracts: Vec<Contract> = self.load(CONTRACTS_KEY)?;
        contracts.retain(|c| pred(c));
        contracts.sort_by_key(|c| c.created_at);
        Ok(contracts)
    }

    fn bookings_sorted(&self, pred: impl Fn(&Booking) -> bool) -> ClientResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self.load(BOOKINGS_KEY)?;
        bookings.retain(|b| pred(b));
        bookings.sort_by_key(|b| b.booking_date);
        Ok(bookings)
    }

    fn users_with_role(&self, role: Role) -> ClientResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users()?
            .into_iter()
            .map(|stored| stored.user)
            .filter(|u| u.role() == role)
            .collect();
        users.sort_by_key(|u| u.name.to_lowercase());
        Ok(users)
    }

    /// The signed-in user as this store knows them
    ///
    /// Roles always come from the stored account, never from the session copy.
    fn caller(&self) -> ClientResult<User> {
        let session_user = self.session.require_user()?;
        self.users()?
            .into_iter()
            .find(|stored| stored.user.id == session_user.id)
            .map(|stored| stored.user)
            .ok_or_else(|| {
                ClientError::Forbidden(
                    "This account is not available offline. Please login again.".to_string(),
                )
            })
    }

    fn seed(&self) -> Result<(), StorageError> {
        let _guard = self.lock();
        if self.store.get(USERS_KEY)?.is_some() {
            return Ok(());
        }

        let now = Utc::now();
        let account = |name: &str, email: &str, profile: Profile| StoredUser {
            user: User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                profile,
                created_at: Some(now),
            },
            password_digest: digest_password(DEMO_PASSWORD),
        };

        let john = account("John Doe", "user@example.com", Profile::Attendee);
        let priya = account("Priya Sharma", "user2@example.com", Profile::Attendee);
        let organizer = account(
            "Event Organizer",
            "organizer@example.com",
            Profile::Organizer(OrganizerProfile {
                kind: Some("Event Management".to_string()),
                location: Some("Chennai, Tamil Nadu".to_string()),
                ..Default::default()
            }),
        );
        let stage = account(
            "Stage Works",
            "organizer2@example.com",
            Profile::Organizer(OrganizerProfile {
                kind: Some("Venue".to_string()),
                location: Some("Bangalore, Karnataka".to_string()),
                ..Default::default()
            }),
        );
        let rock = account(
            "Musician",
            "musician@example.com",
            Profile::Musician(MusicianProfile {
                genre: Some("Rock".to_string()),
                location: Some("Chennai, Tamil Nadu".to_string()),
                price: Some(25000.0),
                ..Default::default()
            }),
        );
        let jazz = account(
            "Asha Rao",
            "musician2@example.com",
            Profile::Musician(MusicianProfile {
                genre: Some("Jazz".to_string()),
                location: Some("Bangalore, Karnataka".to_string()),
                price: Some(30000.0),
                ..Default::default()
            }),
        );

        let demo_event = |details: EventDetails| {
            Event::new(
                Uuid::new_v4(),
                NewEvent {
                    details,
                    organizer_id: organizer.user.id,
                    organizer_name: organizer.user.name.clone(),
                    musician_id: None,
                    musician_name: None,
                    contract_id: None,
                },
                now,
            )
        };

        let mut events = vec![
            demo_event(EventDetails {
                name: "Rock Night Extravaganza".to_string(),
                description: "Experience the ultimate rock music festival with top artists \
                              from around the world."
                    .to_string(),
                location: "Chennai, Tamil Nadu".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 8, 25).unwrap_or_default(),
                time: "7:00 PM".to_string(),
                price: 1500.0,
                category: "Rock".to_string(),
                total_tickets: 100,
            }),
            demo_event(EventDetails {
                name: "Jazz Evening Soiree".to_string(),
                description: "A sophisticated evening of smooth jazz and elegant melodies."
                    .to_string(),
                location: "Bangalore, Karnataka".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 9, 2).unwrap_or_default(),
                time: "6:30 PM".to_string(),
                price: 1200.0,
                category: "Jazz".to_string(),
                total_tickets: 50,
            }),
        ];

        // Demo bookings come out of the demo events' ticket pools
        let mut bookings = Vec::new();
        for (event, attendee, tickets) in [(0, &john, 2), (1, &priya, 4)] {
            let event = &mut events[event];
            if event.reserve(tickets).is_ok() {
                bookings.push(Booking::issue(
                    attendee.user.id,
                    attendee.user.name.clone(),
                    event.id,
                    tickets,
                    now,
                ));
            }
        }

        let users = vec![john, priya, organizer, stage, rock, jazz];
        self.save(EVENTS_KEY, &events)?;
        self.save(BOOKINGS_KEY, &bookings)?;
        self.save::<Contract>(CONTRACTS_KEY, &[])?;
        // Users mark the seed as done, so they go last
        self.save(USERS_KEY, &users)?;

        tracing::info!(
            users = users.len(),
            events = events.len(),
            "Seeded local fallback store"
        );
        Ok(())
    }
}

#[async_trait]
impl Backend for LocalStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse> {
        request.validate()?;
        let profile = request
            .profile()
            .map_err(|e| ClientError::Validation(format!("Invalid profile: {}", e)))?;

        let _guard = self.lock();
        let mut users = self.users()?;
        let email = request.email.trim();
        if users
            .iter()
            .any(|stored| stored.user.email.eq_ignore_ascii_case(email))
        {
            return Err(ClientError::Validation(
                "User with this email already exists".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email: email.to_string(),
            profile,
            created_at: Some(Utc::now()),
        };
        users.push(StoredUser {
            user: user.clone(),
            password_digest: digest_password(&request.password),
        });
        self.save(USERS_KEY, &users)?;

        tracing::info!(user_id = %user.id, role = %user.role(), "Registered local account");
        Ok(AuthResponse::new(
            format!("{}{}", TOKEN_PREFIX, random_token(32)),
            &user,
        ))
    }

    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        let email = request.email.trim();
        let user = self
            .users()?
            .into_iter()
            .find(|stored| {
                stored.user.email.eq_ignore_ascii_case(email)
                    && verify_digest(&request.password, &stored.password_digest)
            })
            .map(|stored| stored.user)
            .ok_or_else(|| ClientError::Unauthorized("Invalid email or password".to_string()))?;

        Ok(AuthResponse::new(
            format!("{}{}", TOKEN_PREFIX, random_token(32)),
            &user,
        ))
    }

    async fn artists(&self) -> ClientResult<Vec<User>> {
        self.users_with_role(Role::Musician)
    }

    async fn organizers(&self) -> ClientResult<Vec<User>> {
        self.users_with_role(Role::Organizer)
    }

    async fn user(&self, id: Uuid) -> ClientResult<User> {
        self.users()?
            .into_iter()
            .find(|stored| stored.user.id == id)
            .map(|stored| stored.user)
            .ok_or_else(|| not_found("User", id))
    }

    async fn events(&self) -> ClientResult<Vec<Event>> {
        self.events_sorted(|_| true)
    }

    async fn upcoming_events(&self) -> ClientResult<Vec<Event>> {
        let today = today();
        self.events_sorted(|e| e.is_upcoming(today))
    }

    async fn event(&self, id: Uuid) -> ClientResult<Event> {
        self.load::<Event>(EVENTS_KEY)?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("Event", id))
    }

    async fn organizer_events(&self, organizer_id: Uuid) -> ClientResult<Vec<Event>> {
        self.events_sorted(|e| e.organizer_id == organizer_id)
    }

    async fn create_event(&self, input: &NewEvent) -> ClientResult<Event> {
        let organizer = self.caller()?;

        let _guard = self.lock();
        let mut contracts: Vec<Contract> = self.load(CONTRACTS_KEY)?;
        let contract_index = match input.contract_id {
            Some(id) => Some(
                contracts
                    .iter()
                    .position(|c| c.id == id)
                    .ok_or_else(|| not_found("Contract", id))?,
            ),
            None => None,
        };

        let checked = workflow::check_event_creation(
            &organizer,
            contract_index.map(|i| &contracts[i]),
            input.musician_id,
            input.details.clone(),
        )?;

        let now = Utc::now();
        let event = Event::new(Uuid::new_v4(), checked, now);
        let previous = contracts.clone();
        if let Some(i) = contract_index {
            contracts[i].link_event(event.id, now)?;
        }

        let mut events: Vec<Event> = self.load(EVENTS_KEY)?;
        events.push(event.clone());
        self.save_linked(CONTRACTS_KEY, &contracts[..], &previous[..], EVENTS_KEY, &events[..])?;

        tracing::info!(event_id = %event.id, contract_id = ?event.contract_id, "Created local event");
        Ok(event)
    }

    async fn update_event(&self, id: Uuid, update: &EventUpdate) -> ClientResult<Event> {
        let caller = self.caller()?;

        let _guard = self.lock();
        let mut events: Vec<Event> = self.load(EVENTS_KEY)?;
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("Event", id))?;

        if event.organizer_id != caller.id {
            return Err(ClientError::Forbidden(
                "Only the event's organizer can edit it".to_string(),
            ));
        }
        event.apply_update(update.clone())?;

        let updated = event.clone();
        self.save(EVENTS_KEY, &events)?;
        Ok(updated)
    }

    async fn delete_event(&self, id: Uuid) -> ClientResult<()> {
        let caller = self.caller()?;

        let _guard = self.lock();
        let mut events: Vec<Event> = self.load(EVENTS_KEY)?;
        let event = events
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("Event", id))?;

        if event.organizer_id != caller.id {
            return Err(ClientError::Forbidden(
                "Only the event's organizer can delete it".to_string(),
            ));
        }
        if event.booked_tickets() > 0 {
            return Err(ClientError::Validation(
                "Event has bookings and cannot be deleted".to_string(),
            ));
        }

        events.retain(|e| e.id != id);
        self.save(EVENTS_KEY, &events)?;
        Ok(())
    }

    async fn create_booking(&self, request: &BookingRequest) -> ClientResult<Booking> {
        let caller = self.caller()?;

        let _guard = self.lock();
        let mut events: Vec<Event> = self.load(EVENTS_KEY)?;
        let event = events
            .iter_mut()
            .find(|e| e.id == request.event_id)
            .ok_or_else(|| not_found("Event", request.event_id))?;

        workflow::check_booking(caller.role(), event, request.tickets)?;
        let remaining = event.reserve(request.tickets)?;

        let booking = Booking::issue(
            caller.id,
            caller.display_name(),
            event.id,
            request.tickets,
            Utc::now(),
        );

        let mut bookings: Vec<Booking> = self.load(BOOKINGS_KEY)?;
        bookings.push(booking.clone());
        let previous = &bookings[..bookings.len() - 1];
        self.save_linked(BOOKINGS_KEY, &bookings[..], previous, EVENTS_KEY, &events[..])?;

        tracing::info!(
            booking_id = %booking.id,
            event_id = %booking.event_id,
            tickets = booking.tickets,
            remaining,
            "Booked local tickets"
        );
        Ok(booking)
    }

    async fn user_bookings(&self, user_id: Uuid) -> ClientResult<Vec<Booking>> {
        self.bookings_sorted(|b| b.user_id == user_id)
    }

    async fn event_bookings(&self, event_id: Uuid) -> ClientResult<Vec<Booking>> {
        self.bookings_sorted(|b| b.event_id == event_id)
    }

    async fn booking(&self, id: Uuid) -> ClientResult<Booking> {
        self.load::<Booking>(BOOKINGS_KEY)?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| not_found("Booking", id))
    }

    async fn create_contract(&self, offer: &NewContract) -> ClientResult<Contract> {
        let organizer = self.caller()?;
        let artist = self.user(offer.artist_id).await?;
        workflow::check_contract_offer(&organizer, &artist, &offer.terms)?;

        let mut offer = offer.clone();
        offer.organizer_id = organizer.id;
        offer.organizer_name = organizer.display_name().to_string();
        offer.artist_name = artist.display_name().to_string();
        let contract = Contract::new(Uuid::new_v4(), offer, Utc::now());

        let _guard = self.lock();
        let mut contracts: Vec<Contract> = self.load(CONTRACTS_KEY)?;
        contracts.push(contract.clone());
        self.save(CONTRACTS_KEY, &contracts)?;

        tracing::info!(contract_id = %contract.id, artist_id = %contract.artist_id, "Created local contract");
        Ok(contract)
    }

    async fn artist_contracts(&self, artist_id: Uuid) -> ClientResult<Vec<Contract>> {
        self.contracts_sorted(|c| c.artist_id == artist_id)
    }

    async fn organizer_contracts(&self, organizer_id: Uuid) -> ClientResult<Vec<Contract>> {
        self.contracts_sorted(|c| c.organizer_id == organizer_id)
    }

    async fn pending_contracts(&self, artist_id: Uuid) -> ClientResult<Vec<Contract>> {
        self.contracts_sorted(|c| c.artist_id == artist_id && c.status == ContractStatus::Pending)
    }

    async fn update_contract_status(
        &self,
        id: Uuid,
        decision: ContractDecision,
    ) -> ClientResult<Contract> {
        let caller = self.caller()?;

        let _guard = self.lock();
        let mut contracts: Vec<Contract> = self.load(CONTRACTS_KEY)?;
        let contract = contracts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Contract", id))?;

        workflow::check_response(&caller, contract)?;
        contract.respond(decision, Utc::now())?;

        let updated = contract.clone();
        self.save(CONTRACTS_KEY, &contracts)?;
        Ok(updated)
    }

    async fn contract(&self, id: Uuid) -> ClientResult<Contract> {
        self.load::<Contract>(CONTRACTS_KEY)?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Contract", id))
    }

    async fn link_event_to_contract(
        &self,
        contract_id: Uuid,
        event_id: Uuid,
    ) -> ClientResult<Contract> {
        let caller = self.caller()?;

        let _guard = self.lock();
        let mut contracts: Vec<Contract> = self.load(CONTRACTS_KEY)?;
        let mut events: Vec<Event> = self.load(EVENTS_KEY)?;
        let previous = contracts.clone();

        let contract = contracts
            .iter_mut()
            .find(|c| c.id == contract_id)
            .ok_or_else(|| not_found("Contract", contract_id))?;
        if contract.organizer_id != caller.id {
            return Err(ClientError::Forbidden(
                "Only the contract's organizer can link an event".to_string(),
            ));
        }

        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| not_found("Event", event_id))?;
        if event.organizer_id != caller.id {
            return Err(ClientError::Forbidden(
                "Event belongs to a different organizer".to_string(),
            ));
        }
        if let Some(existing) = event.contract_id.filter(|existing| *existing != contract_id) {
            return Err(ClientError::Validation(format!(
                "Event {} was created from contract {}",
                event_id, existing
            )));
        }

        contract.link_event(event_id, Utc::now())?;
        event.contract_id = Some(contract_id);
        if event.musician_id.is_none() {
            event.musician_id = Some(contract.artist_id);
            event.musician_name = Some(contract.artist_name.clone());
        }

        let linked = contract.clone();
        self.save_linked(CONTRACTS_KEY, &contracts[..], &previous[..], EVENTS_KEY, &events[..])?;
        Ok(linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, KeyValueStore, MemoryStore};
    use encore_shared::models::{ContractTerms, EventStatus};
    use encore_shared::WorkflowError;
    use std::sync::Arc;

    fn open() -> (LocalStore, Session) {
        let store = MemoryStore::shared();
        let session = Session::restore(store.clone()).unwrap();
        (LocalStore::open(store, session.clone()).unwrap(), session)
    }

    async fn sign_in(local: &LocalStore, session: &Session, email: &str) -> User {
        let auth = local
            .login(&LoginRequest {
                email: email.to_string(),
                password: DEMO_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        let user = auth.user().unwrap();
        session.sign_in(auth.token, user.clone()).unwrap();
        user
    }

    fn terms() -> ContractTerms {
        ContractTerms {
            event_name: "Jazz Night".to_string(),
            venue: "Blue Room".to_string(),
            event_date: NaiveDate::from_ymd_opt(2030, 5, 1),
            payment_amount: 50000.0,
            ..Default::default()
        }
    }

    fn details(total: u32) -> EventDetails {
        EventDetails {
            name: "Jazz Night".to_string(),
            description: "Live quartet".to_string(),
            location: "Blue Room".to_string(),
            date: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
            time: "8:00 PM".to_string(),
            price: 800.0,
            category: "Jazz".to_string(),
            total_tickets: total,
        }
    }

    /// Organizer sends, musician accepts, organizer creates the event
    async fn ready_event(local: &LocalStore, session: &Session, total: u32) -> Event {
        let organizer = sign_in(local, session, "organizer@example.com").await;
        let artist = local.artists().await.unwrap().remove(0);
        let contract = local
            .create_contract(&NewContract {
                organizer_id: organizer.id,
                organizer_name: String::new(),
                artist_id: artist.id,
                artist_name: String::new(),
                terms: terms(),
            })
            .await
            .unwrap();

        sign_in(local, session, &artist.email).await;
        local
            .update_contract_status(contract.id, ContractDecision::Accept)
            .await
            .unwrap();

        sign_in(local, session, "organizer@example.com").await;
        local
            .create_event(&NewEvent {
                details: details(total),
                organizer_id: organizer.id,
                organizer_name: String::new(),
                musician_id: None,
                musician_name: None,
                contract_id: Some(contract.id),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_seed_data() {
        let (local, _) = open();

        assert_eq!(local.artists().await.unwrap().len(), 2);
        assert_eq!(local.organizers().await.unwrap().len(), 2);

        let events = local.events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "Rock Night Extravaganza");
        assert_eq!(events[1].name, "Jazz Evening Soiree");

        for event in &events {
            let booked: u32 = local
                .event_bookings(event.id)
                .await
                .unwrap()
                .iter()
                .map(|b| b.tickets)
                .sum();
            assert_eq!(event.available_tickets + booked, event.total_tickets);
        }
    }

    #[tokio::test]
    async fn test_seed_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let store: SharedStore = Arc::new(FileStore::new(dir.path()).unwrap());
        let session = Session::restore(store.clone()).unwrap();

        let first = LocalStore::open(store.clone(), session.clone()).unwrap();
        let ids: Vec<Uuid> = first.events().await.unwrap().iter().map(|e| e.id).collect();

        let second = LocalStore::open(store, session).unwrap();
        let again: Vec<Uuid> = second.events().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, again);
    }

    #[tokio::test]
    async fn test_passwords_are_not_stored_in_plaintext() {
        let store = MemoryStore::shared();
        let session = Session::restore(store.clone()).unwrap();
        let _local = LocalStore::open(store.clone(), session).unwrap();

        let raw = store.get(USERS_KEY).unwrap().unwrap();
        assert!(!raw.contains("\"password\""));
        assert!(raw.contains("passwordDigest"));
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (local, _) = open();
        let request = RegisterRequest::new("New Fan", "fan@example.com", "secret1", &Profile::Attendee);

        let auth = local.register(&request).await.unwrap();
        assert!(auth.token.starts_with("local-"));
        assert_eq!(auth.role, Role::User);

        let duplicate = RegisterRequest::new("Again", "FAN@example.com", "secret1", &Profile::Attendee);
        assert!(matches!(
            local.register(&duplicate).await,
            Err(ClientError::Validation(_))
        ));

        let ok = local
            .login(&LoginRequest {
                email: "fan@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok.id, auth.id);

        let wrong = local
            .login(&LoginRequest {
                email: "fan@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(wrong.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_contract_to_event_links_once() {
        let (local, session) = open();
        let event = ready_event(&local, &session, 10).await;

        let contract_id = event.contract_id.unwrap();
        let contract = local.contract(contract_id).await.unwrap();
        assert_eq!(contract.event_id, Some(event.id));
        assert_eq!(event.musician_id, Some(contract.artist_id));
        assert_eq!(event.available_tickets, 10);

        // Idempotent for the same event
        local.link_event_to_contract(contract_id, event.id).await.unwrap();

        let organizer = session.require_user().unwrap();
        let err = local
            .create_event(&NewEvent {
                details: details(10),
                organizer_id: organizer.id,
                organizer_name: String::new(),
                musician_id: None,
                musician_name: None,
                contract_id: Some(contract_id),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Workflow(WorkflowError::ContractAlreadyLinked { .. })
        ));
    }

    #[tokio::test]
    async fn test_contract_answered_once() {
        let (local, session) = open();
        let organizer = sign_in(&local, &session, "organizer@example.com").await;
        let artist = local.artists().await.unwrap().remove(0);
        let contract = local
            .create_contract(&NewContract {
                organizer_id: organizer.id,
                organizer_name: String::new(),
                artist_id: artist.id,
                artist_name: String::new(),
                terms: terms(),
            })
            .await
            .unwrap();
        assert_eq!(local.pending_contracts(artist.id).await.unwrap().len(), 1);

        // Organizers cannot answer
        assert!(local
            .update_contract_status(contract.id, ContractDecision::Accept)
            .await
            .is_err());

        sign_in(&local, &session, &artist.email).await;
        local
            .update_contract_status(contract.id, ContractDecision::Reject)
            .await
            .unwrap();
        let err = local
            .update_contract_status(contract.id, ContractDecision::Accept)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Workflow(WorkflowError::InvalidTransition { .. })
        ));
        assert!(local.pending_contracts(artist.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sold_out_and_insufficient() {
        let (local, session) = open();
        let event = ready_event(&local, &session, 10).await;
        sign_in(&local, &session, "user@example.com").await;

        let book = |tickets| BookingRequest {
            event_id: event.id,
            tickets,
            user_id: None,
            user_name: None,
        };

        let err = local.create_booking(&book(11)).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Workflow(WorkflowError::InsufficientTickets { .. })
        ));

        let booking = local.create_booking(&book(10)).await.unwrap();
        assert!(booking.qr_code.starts_with("QR-"));
        assert_eq!(local.event(event.id).await.unwrap().available_tickets, 0);

        let err = local.create_booking(&book(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Event is sold out");
    }

    /// Memory store whose writes to one key can be made to fail
    #[derive(Debug, Default)]
    struct FailingStore {
        inner: MemoryStore,
        fail_on: Mutex<Option<&'static str>>,
    }

    impl FailingStore {
        fn fail_writes_to(&self, key: Option<&'static str>) {
            *self.fail_on.lock().unwrap() = key;
        }
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if *self.fail_on.lock().unwrap() == Some(key) {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn open_failing() -> (LocalStore, Session, Arc<FailingStore>) {
        let store = Arc::new(FailingStore::default());
        let session = Session::restore(store.clone()).unwrap();
        let local = LocalStore::open(store.clone(), session.clone()).unwrap();
        (local, session, store)
    }

    #[tokio::test]
    async fn test_failed_booking_write_leaves_no_orphan() {
        let (local, session, store) = open_failing();
        let event = ready_event(&local, &session, 10).await;
        sign_in(&local, &session, "user@example.com").await;

        store.fail_writes_to(Some(EVENTS_KEY));
        let err = local
            .create_booking(&BookingRequest {
                event_id: event.id,
                tickets: 4,
                user_id: None,
                user_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Storage(StorageError::Io { .. })));
        store.fail_writes_to(None);

        assert!(local.event_bookings(event.id).await.unwrap().is_empty());
        assert_eq!(local.event(event.id).await.unwrap().available_tickets, 10);
    }

    #[tokio::test]
    async fn test_failed_event_write_keeps_contract_open() {
        let (local, session, store) = open_failing();
        let organizer = sign_in(&local, &session, "organizer@example.com").await;
        let artist = local.artists().await.unwrap().remove(0);
        let contract = local
            .create_contract(&NewContract {
                organizer_id: organizer.id,
                organizer_name: String::new(),
                artist_id: artist.id,
                artist_name: String::new(),
                terms: terms(),
            })
            .await
            .unwrap();
        sign_in(&local, &session, &artist.email).await;
        local
            .update_contract_status(contract.id, ContractDecision::Accept)
            .await
            .unwrap();
        sign_in(&local, &session, "organizer@example.com").await;
        let before = local.events().await.unwrap().len();

        let input = NewEvent {
            details: details(10),
            organizer_id: organizer.id,
            organizer_name: String::new(),
            musician_id: None,
            musician_name: None,
            contract_id: Some(contract.id),
        };
        store.fail_writes_to(Some(EVENTS_KEY));
        let err = local.create_event(&input).await.unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
        store.fail_writes_to(None);

        let stored = local.contract(contract.id).await.unwrap();
        assert!(stored.is_open_for_event());
        assert_eq!(stored.event_id, None);
        assert_eq!(local.events().await.unwrap().len(), before);

        // Retrying once the store recovers links the contract
        let event = local.create_event(&input).await.unwrap();
        assert_eq!(local.contract(contract.id).await.unwrap().event_id, Some(event.id));
    }

    #[tokio::test]
    async fn test_only_attendees_book() {
        let (local, session) = open();
        let event = ready_event(&local, &session, 10).await;

        let err = local
            .create_booking(&BookingRequest {
                event_id: event.id,
                tickets: 1,
                user_id: None,
                user_name: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), workflow::ATTENDEES_ONLY);
        assert_eq!(local.event(event.id).await.unwrap().available_tickets, 10);
    }

    #[tokio::test]
    async fn test_mutations_require_session() {
        let (local, _) = open();
        let event = local.events().await.unwrap().remove(0);

        let err = local.delete_event(event.id).await.unwrap_err();
        assert!(matches!(err, ClientError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_event_update_rules() {
        let (local, session) = open();
        let event = ready_event(&local, &session, 10).await;

        let updated = local
            .update_event(event.id, &EventUpdate::completed())
            .await
            .unwrap();
        assert_eq!(updated.status, EventStatus::Completed);

        let err = local
            .update_event(
                event.id,
                &EventUpdate {
                    available_tickets: Some(11),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Workflow(WorkflowError::Validation(_))));

        sign_in(&local, &session, "organizer2@example.com").await;
        assert!(matches!(
            local.delete_event(event.id).await,
            Err(ClientError::Forbidden(_))
        ));
    }
}
