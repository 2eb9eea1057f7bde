/// Workflow orchestration
///
/// [`Marketplace`] is what a front end drives. It checks the shared workflow
/// rules locally before anything goes over the wire, then delegates to the
/// selected [`Backend`], which checks them again.
///
/// # Flow
///
/// ```text
/// organizer: send_contract ──> PENDING
/// musician:  respond_to_contract ──> ACCEPTED | REJECTED (once)
/// organizer: create_event(accepted contract) ──> event UPCOMING, contract linked
/// attendee:  book_tickets ──> booking + QR code, availableTickets decremented
/// organizer: sweep_completed ──> past events COMPLETED
/// ```

use chrono::NaiveDate;
use encore_shared::models::{
    Booking, BookingRequest, Contract, ContractDecision, ContractStatus, ContractTerms, Event,
    EventDetails, EventStatus, EventUpdate, LoginRequest, NewContract, NewEvent, RegisterRequest,
    Role, TicketPass, User,
};
use encore_shared::workflow::{self, MUSICIAN_REQUIRED};
use encore_shared::WorkflowError;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::backend::{Backend, BackendKind};
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// Tickets of an attendee, split by date
#[derive(Debug, Clone, Default)]
pub struct AttendeeDashboard {
    pub upcoming: Vec<TicketPass>,
    pub past: Vec<TicketPass>,
    pub total_spent: f64,
}

/// Events and contracts of an organizer
#[derive(Debug, Clone, Default)]
pub struct OrganizerDashboard {
    pub upcoming_events: Vec<Event>,
    pub completed_events: Vec<Event>,
    pub pending_contracts: Vec<Contract>,
    pub accepted_contracts: Vec<Contract>,
    pub rejected_contracts: Vec<Contract>,

    /// Accepted contracts with no event yet
    pub ready_contracts: Vec<Contract>,

    /// Musicians that can receive a contract
    pub artists: Vec<User>,
}

/// Offers and performances of a musician
#[derive(Debug, Clone, Default)]
pub struct MusicianDashboard {
    pub pending_contracts: Vec<Contract>,
    pub accepted_contracts: Vec<Contract>,
    pub performances: Vec<Event>,

    /// Sum of accepted contract payments
    pub earnings: f64,
}

/// Front-end facing marketplace operations
#[derive(Debug, Clone)]
pub struct Marketplace {
    backend: Arc<dyn Backend>,
    session: Session,
}

impl Marketplace {
    pub fn new(backend: Arc<dyn Backend>, session: Session) -> Self {
        Self { backend, session }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.user()
    }

    fn require_role(&self, role: Role, action: &str) -> ClientResult<User> {
        let user = self.session.require_user()?;
        workflow::ensure_role(user.role(), role, action)?;
        Ok(user)
    }

    // ---- session ----

    /// Creates an account and signs it in
    pub async fn register(&self, request: RegisterRequest) -> ClientResult<User> {
        request.validate()?;
        let auth = self.backend.register(&request).await?;
        let user = auth
            .user()
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        self.session.sign_in(auth.token, user.clone())?;
        Ok(user)
    }

    /// Signs in
    ///
    /// On failure the current session, if any, is left as it was.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let auth = self.backend.login(&request).await?;
        let user = auth
            .user()
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        self.session.sign_in(auth.token, user.clone())?;
        Ok(user)
    }

    pub fn logout(&self) -> ClientResult<()> {
        self.session.clear()?;
        Ok(())
    }

    // ---- lookups ----

    pub async fn events(&self) -> ClientResult<Vec<Event>> {
        self.backend.events().await
    }

    pub async fn upcoming_events(&self) -> ClientResult<Vec<Event>> {
        self.backend.upcoming_events().await
    }

    pub async fn event(&self, id: Uuid) -> ClientResult<Event> {
        self.backend.event(id).await
    }

    pub async fn artists(&self) -> ClientResult<Vec<User>> {
        self.backend.artists().await
    }

    pub async fn organizers(&self) -> ClientResult<Vec<User>> {
        self.backend.organizers().await
    }

    /// Bookings of the signed-in user
    pub async fn my_bookings(&self) -> ClientResult<Vec<Booking>> {
        let user = self.session.require_user()?;
        self.backend.user_bookings(user.id).await
    }

    /// Contracts of the signed-in organizer or musician
    pub async fn my_contracts(&self) -> ClientResult<Vec<Contract>> {
        let user = self.session.require_user()?;
        match user.role() {
            Role::Organizer => self.backend.organizer_contracts(user.id).await,
            Role::Musician => self.backend.artist_contracts(user.id).await,
            Role::User => Err(WorkflowError::Forbidden(
                "Only organizers and musicians have contracts".to_string(),
            )
            .into()),
        }
    }

    // ---- contract → event → booking ----

    /// Sends `terms` to a musician as a pending contract
    pub async fn send_contract(&self, artist_id: Uuid, terms: ContractTerms) -> ClientResult<Contract> {
        let organizer = self.require_role(Role::Organizer, "send contracts")?;
        workflow::validate_terms(&terms)?;

        let artist = self.backend.user(artist_id).await?;
        workflow::check_contract_offer(&organizer, &artist, &terms)?;

        let contract = self
            .backend
            .create_contract(&NewContract {
                organizer_id: organizer.id,
                organizer_name: organizer.display_name().to_string(),
                artist_id: artist.id,
                artist_name: artist.display_name().to_string(),
                terms,
            })
            .await?;

        tracing::info!(contract_id = %contract.id, artist_id = %artist.id, "Contract sent");
        Ok(contract)
    }

    /// Accepts or rejects a pending contract addressed to the signed-in musician
    pub async fn respond_to_contract(
        &self,
        contract_id: Uuid,
        decision: ContractDecision,
    ) -> ClientResult<Contract> {
        let musician = self.session.require_user()?;
        let contract = self.backend.contract(contract_id).await?;
        workflow::check_response(&musician, &contract)?;

        let target = decision.target_status();
        if !contract.status.can_transition_to(target) {
            return Err(WorkflowError::InvalidTransition {
                from: contract.status,
                to: target,
            }
            .into());
        }

        let updated = self
            .backend
            .update_contract_status(contract_id, decision)
            .await?;

        tracing::info!(contract_id = %updated.id, status = %updated.status, "Contract answered");
        Ok(updated)
    }

    /// Creates an event from an accepted contract and links the two
    ///
    /// `contract_id` is the musician selection: without it the event is
    /// refused before any request is made.
    pub async fn create_event(
        &self,
        contract_id: Option<Uuid>,
        details: EventDetails,
    ) -> ClientResult<Event> {
        let organizer = self.require_role(Role::Organizer, "create events")?;
        let contract_id = contract_id
            .ok_or_else(|| WorkflowError::Validation(MUSICIAN_REQUIRED.to_string()))?;

        let contract = self.backend.contract(contract_id).await?;
        let input: NewEvent =
            workflow::check_event_creation(&organizer, Some(&contract), None, details)?;

        let event = self.backend.create_event(&input).await?;
        self.backend
            .link_event_to_contract(contract_id, event.id)
            .await?;

        tracing::info!(
            event_id = %event.id,
            contract_id = %contract_id,
            musician_id = ?event.musician_id,
            "Event created from contract"
        );
        Ok(event)
    }

    /// Books `count` tickets for the signed-in attendee
    pub async fn book_tickets(&self, event_id: Uuid, count: u32) -> ClientResult<Booking> {
        let user = self.session.require_user()?;
        let event = self.backend.event(event_id).await?;
        workflow::check_booking(user.role(), &event, count)?;

        let booking = self
            .backend
            .create_booking(&BookingRequest {
                event_id,
                tickets: count,
                user_id: Some(user.id),
                user_name: Some(user.display_name().to_string()),
            })
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            event_id = %event_id,
            tickets = count,
            "Tickets booked"
        );
        Ok(booking)
    }

    /// Marks `event` completed if its date has passed
    ///
    /// Returns the updated event, or `None` when nothing had to change.
    pub async fn mark_completed_if_past(
        &self,
        event: &Event,
        today: NaiveDate,
    ) -> ClientResult<Option<Event>> {
        if !event.is_past(today) || event.status == EventStatus::Completed {
            return Ok(None);
        }

        let updated = self
            .backend
            .update_event(event.id, &EventUpdate::completed())
            .await?;
        tracing::debug!(event_id = %event.id, "Event marked completed");
        Ok(Some(updated))
    }

    /// Marks every past event of the signed-in organizer completed
    ///
    /// Returns how many events changed.
    pub async fn sweep_completed(&self, today: NaiveDate) -> ClientResult<usize> {
        let organizer = self.require_role(Role::Organizer, "complete events")?;

        let mut changed = 0;
        for event in self.backend.organizer_events(organizer.id).await? {
            if self.mark_completed_if_past(&event, today).await?.is_some() {
                changed += 1;
            }
        }

        if changed > 0 {
            tracing::info!(organizer_id = %organizer.id, changed, "Past events completed");
        }
        Ok(changed)
    }

    // ---- dashboards ----

    pub async fn attendee_dashboard(&self, today: NaiveDate) -> ClientResult<AttendeeDashboard> {
        let user = self.require_role(Role::User, "view tickets")?;
        let bookings = self.backend.user_bookings(user.id).await?;
        let events: HashMap<Uuid, Event> = self
            .backend
            .events()
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let mut dashboard = AttendeeDashboard::default();
        for booking in &bookings {
            let Some(event) = events.get(&booking.event_id) else {
                tracing::debug!(booking_id = %booking.id, "Booking for a removed event");
                continue;
            };

            let pass = TicketPass::new(booking, event);
            dashboard.total_spent += pass.price * f64::from(pass.ticket_count);
            if event.is_upcoming(today) {
                dashboard.upcoming.push(pass);
            } else {
                dashboard.past.push(pass);
            }
        }
        Ok(dashboard)
    }

    /// Organizer overview; completes past events first
    pub async fn organizer_dashboard(&self, today: NaiveDate) -> ClientResult<OrganizerDashboard> {
        let organizer = self.require_role(Role::Organizer, "view the organizer dashboard")?;
        self.sweep_completed(today).await?;

        let (completed_events, upcoming_events): (Vec<Event>, Vec<Event>) = self
            .backend
            .organizer_events(organizer.id)
            .await?
            .into_iter()
            .partition(|e| e.status == EventStatus::Completed);

        let contracts = self.backend.organizer_contracts(organizer.id).await?;
        let ready_contracts = contracts
            .iter()
            .filter(|c| c.is_open_for_event())
            .cloned()
            .collect();

        let by_status = |status: ContractStatus| {
            contracts
                .iter()
                .filter(|c| c.status == status)
                .cloned()
                .collect::<Vec<_>>()
        };

        Ok(OrganizerDashboard {
            upcoming_events,
            completed_events,
            pending_contracts: by_status(ContractStatus::Pending),
            accepted_contracts: by_status(ContractStatus::Accepted),
            rejected_contracts: by_status(ContractStatus::Rejected),
            ready_contracts,
            artists: self.backend.artists().await?,
        })
    }

    pub async fn musician_dashboard(&self) -> ClientResult<MusicianDashboard> {
        let musician = self.require_role(Role::Musician, "view the musician dashboard")?;
        let contracts = self.backend.artist_contracts(musician.id).await?;

        let (accepted_contracts, rest): (Vec<_>, Vec<_>) = contracts
            .into_iter()
            .partition(|c| c.status == ContractStatus::Accepted);
        let pending_contracts = rest
            .into_iter()
            .filter(|c| c.status == ContractStatus::Pending)
            .collect();

        let earnings = accepted_contracts
            .iter()
            .map(|c| c.terms.payment_amount)
            .sum();

        let performances = self
            .backend
            .events()
            .await?
            .into_iter()
            .filter(|e| e.musician_id == Some(musician.id))
            .collect();

        Ok(MusicianDashboard {
            pending_contracts,
            accepted_contracts,
            performances,
            earnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::{LocalStore, DEMO_PASSWORD};
    use crate::storage::MemoryStore;

    fn market() -> Marketplace {
        let store = MemoryStore::shared();
        let session = Session::restore(store.clone()).unwrap();
        let local = LocalStore::open(store, session.clone()).unwrap();
        Marketplace::new(Arc::new(local), session)
    }

    fn jazz_terms() -> ContractTerms {
        ContractTerms {
            event_name: "Jazz Night".to_string(),
            venue: "Blue Room".to_string(),
            event_date: NaiveDate::from_ymd_opt(2030, 5, 1),
            payment_amount: 50000.0,
            ..Default::default()
        }
    }

    fn jazz_details(total: u32) -> EventDetails {
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

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    /// Runs the contract flow up to an event with `total` tickets
    async fn jazz_night(market: &Marketplace, total: u32) -> (Contract, Event) {
        market.login("organizer@example.com", DEMO_PASSWORD).await.unwrap();
        let artist = market
            .artists()
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.email == "musician2@example.com")
            .unwrap();
        let contract = market.send_contract(artist.id, jazz_terms()).await.unwrap();
        assert_eq!(contract.status, ContractStatus::Pending);

        market.login(&artist.email, DEMO_PASSWORD).await.unwrap();
        let accepted = market
            .respond_to_contract(contract.id, ContractDecision::Accept)
            .await
            .unwrap();
        assert_eq!(accepted.status, ContractStatus::Accepted);

        market.login("organizer@example.com", DEMO_PASSWORD).await.unwrap();
        let event = market
            .create_event(Some(contract.id), jazz_details(total))
            .await
            .unwrap();
        (accepted, event)
    }

    #[tokio::test]
    async fn test_jazz_night_flow() {
        let market = market();
        let (contract, event) = jazz_night(&market, 100).await;

        assert_eq!(event.available_tickets, 100);
        assert_eq!(event.musician_id, Some(contract.artist_id));
        assert_eq!(event.status, EventStatus::Upcoming);

        let dashboard = market.organizer_dashboard(today()).await.unwrap();
        assert!(dashboard.ready_contracts.is_empty());
        assert_eq!(dashboard.accepted_contracts.len(), 1);
        assert_eq!(dashboard.accepted_contracts[0].event_id, Some(event.id));

        market.login("user@example.com", DEMO_PASSWORD).await.unwrap();
        let booking = market.book_tickets(event.id, 3).await.unwrap();
        assert_eq!(booking.tickets, 3);
        assert_eq!(market.event(event.id).await.unwrap().available_tickets, 97);

        let tickets = market.attendee_dashboard(today()).await.unwrap();
        assert!(tickets.upcoming.iter().any(|p| p.booking_id == booking.id));
        assert!(tickets.total_spent >= 2400.0);
    }

    #[tokio::test]
    async fn test_contract_validation_before_request() {
        let market = market();
        market.login("organizer@example.com", DEMO_PASSWORD).await.unwrap();

        let terms = ContractTerms {
            payment_amount: 0.0,
            ..jazz_terms()
        };
        let err = market.send_contract(Uuid::new_v4(), terms).await.unwrap_err();
        assert_eq!(err.to_string(), "Payment amount must be greater than 0");

        let missing_venue = ContractTerms {
            venue: String::new(),
            ..jazz_terms()
        };
        assert!(market
            .send_contract(Uuid::new_v4(), missing_venue)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_contract_answered_once() {
        let market = market();
        market.login("organizer@example.com", DEMO_PASSWORD).await.unwrap();
        let artist = market.artists().await.unwrap().remove(0);
        let contract = market.send_contract(artist.id, jazz_terms()).await.unwrap();

        market.login(&artist.email, DEMO_PASSWORD).await.unwrap();
        market
            .respond_to_contract(contract.id, ContractDecision::Reject)
            .await
            .unwrap();
        let err = market
            .respond_to_contract(contract.id, ContractDecision::Accept)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Contract cannot move from rejected to accepted");

        market.login("organizer@example.com", DEMO_PASSWORD).await.unwrap();
        let err = market
            .create_event(Some(contract.id), jazz_details(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Workflow(WorkflowError::ContractNotAccepted(ContractStatus::Rejected))
        ));
    }

    #[tokio::test]
    async fn test_event_requires_musician() {
        let market = market();
        market.login("organizer@example.com", DEMO_PASSWORD).await.unwrap();

        let err = market.create_event(None, jazz_details(10)).await.unwrap_err();
        assert_eq!(err.to_string(), MUSICIAN_REQUIRED);
    }

    #[tokio::test]
    async fn test_booking_rules() {
        let market = market();
        let (_, event) = jazz_night(&market, 5).await;

        // Organizers are refused before availability is considered
        let err = market.book_tickets(event.id, 1).await.unwrap_err();
        assert_eq!(err.to_string(), workflow::ATTENDEES_ONLY);

        market.login("user@example.com", DEMO_PASSWORD).await.unwrap();
        let err = market.book_tickets(event.id, 6).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Workflow(WorkflowError::InsufficientTickets {
                requested: 6,
                available: 5
            })
        ));

        market.book_tickets(event.id, 5).await.unwrap();
        let err = market.book_tickets(event.id, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Event is sold out");
    }

    #[tokio::test]
    async fn test_sweep_completes_past_events_once() {
        let market = market();
        let (_, event) = jazz_night(&market, 10).await;

        // The two seeded demo events are already in the past
        assert_eq!(market.sweep_completed(today()).await.unwrap(), 2);
        assert_eq!(market.sweep_completed(today()).await.unwrap(), 0);
        assert_eq!(market.event(event.id).await.unwrap().status, EventStatus::Upcoming);

        let after = NaiveDate::from_ymd_opt(2030, 5, 2).unwrap();
        assert_eq!(market.sweep_completed(after).await.unwrap(), 1);
        assert_eq!(market.sweep_completed(after).await.unwrap(), 0);
        assert_eq!(
            market.event(event.id).await.unwrap().status,
            EventStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_musician_dashboard() {
        let market = market();
        let (contract, event) = jazz_night(&market, 10).await;

        market.login("musician2@example.com", DEMO_PASSWORD).await.unwrap();
        let dashboard = market.musician_dashboard().await.unwrap();
        assert!(dashboard.pending_contracts.is_empty());
        assert_eq!(dashboard.accepted_contracts[0].id, contract.id);
        assert_eq!(dashboard.performances[0].id, event.id);
        assert_eq!(dashboard.earnings, 50000.0);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_session() {
        let market = market();
        market.login("user@example.com", DEMO_PASSWORD).await.unwrap();

        let err = market
            .login("organizer@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(
            market.current_user().map(|u| u.email),
            Some("user@example.com".to_string())
        );

        market.logout().unwrap();
        assert!(market.current_user().is_none());
        assert!(market.my_bookings().await.unwrap_err().requires_login());
    }
}
