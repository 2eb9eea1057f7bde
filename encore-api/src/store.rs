/// In-memory marketplace store
///
/// Holds every user, contract, event and booking behind a single
/// `tokio::sync::RwLock`. Reads share the lock; each mutation takes the write
/// lock once and performs its checks and writes under it, which makes the
/// booking availability check and ticket decrement atomic, and makes event
/// creation and contract linking one step.
///
/// Data lives for the lifetime of the process.
///
/// # Example
///
/// ```
/// use encore_api::store::MarketStore;
/// use encore_shared::models::{Profile, User};
/// use uuid::Uuid;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = MarketStore::new();
/// let user = User {
///     id: Uuid::new_v4(),
///     name: "John".to_string(),
///     email: "john@example.com".to_string(),
///     profile: Profile::Attendee,
///     created_at: None,
/// };
/// store.insert_user(user, "hash".to_string()).await?;
/// assert!(store.find_by_email("JOHN@example.com").await.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{NaiveDate, Utc};
use encore_shared::{
    models::{
        Booking, BookingRequest, Contract, ContractDecision, ContractStatus, Event, EventUpdate,
        NewContract, NewEvent, Role, User,
    },
    workflow, WorkflowError,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Registration with an email that is already taken
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Email {0} is already registered")]
pub struct DuplicateEmail(pub String);

/// A user together with their password hash
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Default)]
struct Market {
    users: HashMap<Uuid, Credentials>,
    /// Lowercased email → user id
    emails: HashMap<String, Uuid>,
    contracts: HashMap<Uuid, Contract>,
    events: HashMap<Uuid, Event>,
    bookings: HashMap<Uuid, Booking>,
}

impl Market {
    fn user(&self, id: Uuid) -> Result<&User, WorkflowError> {
        self.users
            .get(&id)
            .map(|c| &c.user)
            .ok_or_else(|| WorkflowError::not_found("User", id))
    }
}

/// Shared marketplace state
#[derive(Debug, Default)]
pub struct MarketStore {
    inner: RwLock<Market>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn sorted_by<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- users ----

    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEmail` if the email (case-insensitive) is taken.
    pub async fn insert_user(&self, user: User, password_hash: String) -> Result<User, DuplicateEmail> {
        let mut market = self.inner.write().await;
        let key = normalize_email(&user.email);
        if market.emails.contains_key(&key) {
            return Err(DuplicateEmail(user.email));
        }

        market.emails.insert(key, user.id);
        market.users.insert(
            user.id,
            Credentials {
                user: user.clone(),
                password_hash,
            },
        );

        tracing::info!(user_id = %user.id, role = %user.role(), "User registered");
        Ok(user)
    }

    /// Looks up credentials by email (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> Option<Credentials> {
        let market = self.inner.read().await;
        market
            .emails
            .get(&normalize_email(email))
            .and_then(|id| market.users.get(id))
            .cloned()
    }

    pub async fn user(&self, id: Uuid) -> Option<User> {
        self.inner.read().await.users.get(&id).map(|c| c.user.clone())
    }

    /// All users with `role`, ordered by name
    pub async fn users_by_role(&self, role: Role) -> Vec<User> {
        let market = self.inner.read().await;
        let users = market
            .users
            .values()
            .filter(|c| c.user.role() == role)
            .map(|c| c.user.clone())
            .collect();
        sorted_by(users, |u: &User| u.name.to_lowercase())
    }

    // ---- contracts ----

    /// Creates a pending contract from `organizer` to the musician in `offer`
    ///
    /// Names are filled in from the stored accounts.
    pub async fn create_contract(
        &self,
        organizer: &User,
        mut offer: NewContract,
    ) -> Result<Contract, WorkflowError> {
        let mut market = self.inner.write().await;
        let artist = market.user(offer.artist_id)?.clone();

        workflow::check_contract_offer(organizer, &artist, &offer.terms)?;

        offer.organizer_id = organizer.id;
        offer.organizer_name = organizer.display_name().to_string();
        offer.artist_name = artist.display_name().to_string();

        let contract = Contract::new(Uuid::new_v4(), offer, Utc::now());
        market.contracts.insert(contract.id, contract.clone());

        tracing::info!(
            contract_id = %contract.id,
            organizer_id = %contract.organizer_id,
            artist_id = %contract.artist_id,
            "Contract sent"
        );
        Ok(contract)
    }

    pub async fn contract(&self, id: Uuid) -> Option<Contract> {
        self.inner.read().await.contracts.get(&id).cloned()
    }

    async fn contracts_where(&self, pred: impl Fn(&Contract) -> bool) -> Vec<Contract> {
        let market = self.inner.read().await;
        let contracts = market.contracts.values().filter(|c| pred(c)).cloned().collect();
        sorted_by(contracts, |c: &Contract| c.created_at)
    }

    pub async fn contracts_for_artist(&self, artist_id: Uuid) -> Vec<Contract> {
        self.contracts_where(|c| c.artist_id == artist_id).await
    }

    pub async fn contracts_for_organizer(&self, organizer_id: Uuid) -> Vec<Contract> {
        self.contracts_where(|c| c.organizer_id == organizer_id).await
    }

    pub async fn pending_contracts_for_artist(&self, artist_id: Uuid) -> Vec<Contract> {
        self.contracts_where(|c| c.artist_id == artist_id && c.status == ContractStatus::Pending)
            .await
    }

    /// Applies the musician's decision to a pending contract
    pub async fn respond_to_contract(
        &self,
        caller: &User,
        contract_id: Uuid,
        decision: ContractDecision,
    ) -> Result<Contract, WorkflowError> {
        let mut market = self.inner.write().await;
        let contract = market
            .contracts
            .get_mut(&contract_id)
            .ok_or_else(|| WorkflowError::not_found("Contract", contract_id))?;

        workflow::check_response(caller, contract)?;
        let status = contract.respond(decision, Utc::now())?;

        tracing::info!(contract_id = %contract_id, status = %status, "Contract answered");
        Ok(contract.clone())
    }

    /// Links an event to an accepted contract
    ///
    /// Repeating the call with the event the contract already points at
    /// succeeds without changes.
    pub async fn link_event(
        &self,
        caller: &User,
        contract_id: Uuid,
        event_id: Uuid,
    ) -> Result<Contract, WorkflowError> {
        let mut market = self.inner.write().await;
        let market = &mut *market;

        let contract = market
            .contracts
            .get_mut(&contract_id)
            .ok_or_else(|| WorkflowError::not_found("Contract", contract_id))?;
        if contract.organizer_id != caller.id {
            return Err(WorkflowError::Forbidden(
                "Only the contract's organizer can link an event".to_string(),
            ));
        }

        let event = market
            .events
            .get_mut(&event_id)
            .ok_or_else(|| WorkflowError::not_found("Event", event_id))?;
        if event.organizer_id != caller.id {
            return Err(WorkflowError::Forbidden(
                "Event belongs to a different organizer".to_string(),
            ));
        }
        match event.contract_id {
            Some(existing) if existing != contract_id => {
                return Err(WorkflowError::Validation(format!(
                    "Event {} was created from contract {}",
                    event_id, existing
                )))
            }
            _ => {}
        }

        contract.link_event(event_id, Utc::now())?;
        event.contract_id = Some(contract_id);
        if event.musician_id.is_none() {
            event.musician_id = Some(contract.artist_id);
            event.musician_name = Some(contract.artist_name.clone());
        }

        Ok(contract.clone())
    }

    // ---- events ----

    /// Creates an event from an accepted contract and links the two
    pub async fn create_event(&self, organizer: &User, input: NewEvent) -> Result<Event, WorkflowError> {
        let mut market = self.inner.write().await;
        let market = &mut *market;

        let contract = match input.contract_id {
            Some(id) => Some(
                market
                    .contracts
                    .get_mut(&id)
                    .ok_or_else(|| WorkflowError::not_found("Contract", id))?,
            ),
            None => None,
        };

        let checked = workflow::check_event_creation(
            organizer,
            contract.as_deref(),
            input.musician_id,
            input.details,
        )?;

        let now = Utc::now();
        let event = Event::new(Uuid::new_v4(), checked, now);
        if let Some(contract) = contract {
            contract.link_event(event.id, now)?;
        }
        market.events.insert(event.id, event.clone());

        tracing::info!(
            event_id = %event.id,
            contract_id = ?event.contract_id,
            total_tickets = event.total_tickets,
            "Event created"
        );
        Ok(event)
    }

    pub async fn event(&self, id: Uuid) -> Option<Event> {
        self.inner.read().await.events.get(&id).cloned()
    }

    async fn events_where(&self, pred: impl Fn(&Event) -> bool) -> Vec<Event> {
        let market = self.inner.read().await;
        let events = market.events.values().filter(|e| pred(e)).cloned().collect();
        sorted_by(events, |e: &Event| (e.date, e.name.clone()))
    }

    /// All events ordered by date
    pub async fn events(&self) -> Vec<Event> {
        self.events_where(|_| true).await
    }

    /// Upcoming events dated `today` or later
    pub async fn upcoming_events(&self, today: NaiveDate) -> Vec<Event> {
        self.events_where(|e| e.is_upcoming(today)).await
    }

    pub async fn events_for_organizer(&self, organizer_id: Uuid) -> Vec<Event> {
        self.events_where(|e| e.organizer_id == organizer_id).await
    }

    /// Applies a partial update to one of the caller's events
    pub async fn update_event(
        &self,
        caller: &User,
        event_id: Uuid,
        update: EventUpdate,
    ) -> Result<Event, WorkflowError> {
        let mut market = self.inner.write().await;
        let event = market
            .events
            .get_mut(&event_id)
            .ok_or_else(|| WorkflowError::not_found("Event", event_id))?;

        if event.organizer_id != caller.id {
            return Err(WorkflowError::Forbidden(
                "Only the event's organizer can edit it".to_string(),
            ));
        }

        event.apply_update(update)?;
        tracing::debug!(event_id = %event_id, status = %event.status, "Event updated");
        Ok(event.clone())
    }

    /// Deletes one of the caller's events
    ///
    /// Events with bookings are kept so every booking still resolves.
    pub async fn delete_event(&self, caller: &User, event_id: Uuid) -> Result<(), WorkflowError> {
        let mut market = self.inner.write().await;
        let event = market
            .events
            .get(&event_id)
            .ok_or_else(|| WorkflowError::not_found("Event", event_id))?;

        if event.organizer_id != caller.id {
            return Err(WorkflowError::Forbidden(
                "Only the event's organizer can delete it".to_string(),
            ));
        }
        if event.booked_tickets() > 0 {
            return Err(WorkflowError::Validation(
                "Event has bookings and cannot be deleted".to_string(),
            ));
        }

        market.events.remove(&event_id);
        tracing::info!(event_id = %event_id, "Event deleted");
        Ok(())
    }

    // ---- bookings ----

    /// Books tickets for the caller
    ///
    /// The availability check and the decrement happen under one write lock,
    /// so two callers racing for the last ticket cannot both succeed.
    pub async fn book(&self, caller: &User, request: BookingRequest) -> Result<Booking, WorkflowError> {
        let mut market = self.inner.write().await;
        let market = &mut *market;

        let event = market
            .events
            .get_mut(&request.event_id)
            .ok_or_else(|| WorkflowError::not_found("Event", request.event_id))?;

        workflow::check_booking(caller.role(), event, request.tickets)?;
        let remaining = event.reserve(request.tickets)?;

        let booking = Booking::issue(
            caller.id,
            caller.display_name(),
            event.id,
            request.tickets,
            Utc::now(),
        );
        market.bookings.insert(booking.id, booking.clone());

        tracing::info!(
            booking_id = %booking.id,
            event_id = %booking.event_id,
            tickets = booking.tickets,
            remaining,
            "Tickets booked"
        );
        Ok(booking)
    }

    pub async fn booking(&self, id: Uuid) -> Option<Booking> {
        self.inner.read().await.bookings.get(&id).cloned()
    }

    async fn bookings_where(&self, pred: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let market = self.inner.read().await;
        let bookings = market.bookings.values().filter(|b| pred(b)).cloned().collect();
        sorted_by(bookings, |b: &Booking| b.booking_date)
    }

    pub async fn bookings_for_user(&self, user_id: Uuid) -> Vec<Booking> {
        self.bookings_where(|b| b.user_id == user_id).await
    }

    pub async fn bookings_for_event(&self, event_id: Uuid) -> Vec<Booking> {
        self.bookings_where(|b| b.event_id == event_id).await
    }
}
