/// Contract → event → booking rules
///
/// Every backend (the API server and the client's local fallback store) runs
/// the same checks from this module before mutating anything, so both agree on
/// what is allowed:
///
/// 1. An organizer sends a musician a contract with complete terms.
/// 2. Only that musician answers it, once.
/// 3. An accepted contract that has no event yet seeds exactly one event.
/// 4. Only attendees book, and never more tickets than remain.
///
/// # Example
///
/// ```
/// use encore_shared::models::Role;
/// use encore_shared::workflow::{check_availability, ensure_role, WorkflowError};
///
/// assert!(ensure_role(Role::User, Role::User, "book tickets").is_ok());
/// assert!(matches!(
///     ensure_role(Role::Organizer, Role::User, "book tickets"),
///     Err(WorkflowError::Forbidden(_))
/// ));
///
/// assert_eq!(check_availability(0, 1), Err(WorkflowError::SoldOut));
/// ```

use uuid::Uuid;

use crate::models::{
    Contract, ContractStatus, ContractTerms, Event, EventDetails, NewEvent, Role, User,
};

/// Message shown when an event is requested without a bound musician
pub const MUSICIAN_REQUIRED: &str = "Please select a musician from an accepted contract.";

/// Message shown when a non-attendee tries to book
pub const ATTENDEES_ONLY: &str =
    "Only regular users can book tickets. Please login with a user account.";

/// Error type for workflow rule violations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    /// Missing or invalid input
    #[error("{0}")]
    Validation(String),

    /// Caller's role or identity does not allow the action
    #[error("{0}")]
    Forbidden(String),

    /// Contract status change that is not allowed
    #[error("Contract cannot move from {from} to {to}")]
    InvalidTransition {
        from: ContractStatus,
        to: ContractStatus,
    },

    /// Event creation from a contract that is not accepted
    #[error("Contract must be accepted before an event can be created (status: {0})")]
    ContractNotAccepted(ContractStatus),

    /// Contract already seeded an event
    #[error("Contract {contract_id} is already linked to event {event_id}")]
    ContractAlreadyLinked { contract_id: Uuid, event_id: Uuid },

    /// No tickets left
    #[error("Event is sold out")]
    SoldOut,

    /// Fewer tickets left than requested
    #[error("Insufficient tickets: requested {requested}, only {available} available")]
    InsufficientTickets { requested: u32, available: u32 },

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(String),
}

impl WorkflowError {
    /// Shorthand for `NotFound` with an entity name and id
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        WorkflowError::NotFound(format!("{} {}", entity, id))
    }
}

impl From<validator::ValidationErrors> for WorkflowError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field))
                })
            })
            .collect::<Vec<_>>()
            .join("; ");

        WorkflowError::Validation(message)
    }
}

/// Ensures `actual` is the role required for `action`
pub fn ensure_role(actual: Role, required: Role, action: &str) -> Result<(), WorkflowError> {
    if actual == required {
        Ok(())
    } else {
        Err(WorkflowError::Forbidden(format!(
            "Only {}s can {} (signed in as {})",
            required, action, actual
        )))
    }
}

/// Validates contract terms
///
/// Event name, venue and date are required and the payment must be positive.
pub fn validate_terms(terms: &ContractTerms) -> Result<(), WorkflowError> {
    if terms.event_name.trim().is_empty() {
        return Err(WorkflowError::Validation("Event name is required".to_string()));
    }
    if terms.venue.trim().is_empty() {
        return Err(WorkflowError::Validation("Venue is required".to_string()));
    }
    if terms.event_date.is_none() {
        return Err(WorkflowError::Validation("Event date is required".to_string()));
    }
    if !(terms.payment_amount > 0.0 && terms.payment_amount.is_finite()) {
        return Err(WorkflowError::Validation(
            "Payment amount must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Checks that `organizer` may send `artist` a contract with `terms`
pub fn check_contract_offer(
    organizer: &User,
    artist: &User,
    terms: &ContractTerms,
) -> Result<(), WorkflowError> {
    ensure_role(organizer.role(), Role::Organizer, "send contracts")?;
    if artist.role() != Role::Musician {
        return Err(WorkflowError::Validation(format!(
            "{} is not a musician",
            artist.display_name()
        )));
    }
    validate_terms(terms)
}

/// Checks that `caller` may answer `contract`
pub fn check_response(caller: &User, contract: &Contract) -> Result<(), WorkflowError> {
    ensure_role(caller.role(), Role::Musician, "respond to contracts")?;
    if contract.artist_id != caller.id {
        return Err(WorkflowError::Forbidden(
            "Only the musician named on the contract can respond to it".to_string(),
        ));
    }
    Ok(())
}

/// Validates event details entered by an organizer
pub fn validate_event_details(details: &EventDetails) -> Result<(), WorkflowError> {
    if details.name.trim().is_empty() {
        return Err(WorkflowError::Validation("Event name is required".to_string()));
    }
    if details.location.trim().is_empty() {
        return Err(WorkflowError::Validation("Location is required".to_string()));
    }
    if details.total_tickets == 0 {
        return Err(WorkflowError::Validation(
            "Total tickets must be at least 1".to_string(),
        ));
    }
    if !(details.price >= 0.0 && details.price.is_finite()) {
        return Err(WorkflowError::Validation(
            "Price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Checks that `organizer` may create an event from `contract`
///
/// The contract must be the organizer's own, accepted, and not yet linked.
/// The returned input binds the contract's musician to the event.
///
/// # Errors
///
/// - `Validation` with [`MUSICIAN_REQUIRED`] when no contract is given, or
///   when `musician_id` names someone other than the contract's artist
/// - `ContractNotAccepted` / `ContractAlreadyLinked` for unusable contracts
/// - `Forbidden` for non-organizers or someone else's contract
pub fn check_event_creation(
    organizer: &User,
    contract: Option<&Contract>,
    musician_id: Option<Uuid>,
    details: EventDetails,
) -> Result<NewEvent, WorkflowError> {
    ensure_role(organizer.role(), Role::Organizer, "create events")?;

    let contract =
        contract.ok_or_else(|| WorkflowError::Validation(MUSICIAN_REQUIRED.to_string()))?;

    if contract.organizer_id != organizer.id {
        return Err(WorkflowError::Forbidden(
            "Contract belongs to a different organizer".to_string(),
        ));
    }
    if contract.status != ContractStatus::Accepted {
        return Err(WorkflowError::ContractNotAccepted(contract.status));
    }
    if let Some(event_id) = contract.event_id {
        return Err(WorkflowError::ContractAlreadyLinked {
            contract_id: contract.id,
            event_id,
        });
    }
    if musician_id.is_some_and(|id| id != contract.artist_id) {
        return Err(WorkflowError::Validation(MUSICIAN_REQUIRED.to_string()));
    }

    validate_event_details(&details)?;

    Ok(NewEvent {
        details,
        organizer_id: organizer.id,
        organizer_name: organizer.display_name().to_string(),
        musician_id: Some(contract.artist_id),
        musician_name: Some(contract.artist_name.clone()),
        contract_id: Some(contract.id),
    })
}

/// Checks that `role` may book `tickets` on `event`
///
/// The role is checked first, so a non-attendee is refused even when tickets
/// are available.
pub fn check_booking(role: Role, event: &Event, tickets: u32) -> Result<(), WorkflowError> {
    if role != Role::User {
        return Err(WorkflowError::Forbidden(ATTENDEES_ONLY.to_string()));
    }
    check_availability(event.available_tickets, tickets)
}

/// Checks that `requested` tickets can be taken from `available`
pub fn check_availability(available: u32, requested: u32) -> Result<(), WorkflowError> {
    if requested == 0 {
        return Err(WorkflowError::Validation(
            "At least one ticket must be booked".to_string(),
        ));
    }
    if available == 0 {
        return Err(WorkflowError::SoldOut);
    }
    if requested > available {
        return Err(WorkflowError::InsufficientTickets {
            requested,
            available,
        });
    }
    Ok(())
}
