/// Contract model
///
/// A contract is an offer from an organizer to one musician to perform at a
/// named event for a payment. The musician answers it once; an accepted
/// contract can then seed exactly one event.
///
/// # State Machine
///
/// ```text
/// pending → accepted → (linked to one event)
/// pending → rejected
/// ```
///
/// `accepted` and `rejected` are terminal: there is no way back to `pending`
/// and no way across.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, Utc};
/// use encore_shared::models::contract::{Contract, ContractDecision, ContractStatus, ContractTerms, NewContract};
/// use uuid::Uuid;
///
/// let mut contract = Contract::new(Uuid::new_v4(), NewContract {
///     organizer_id: Uuid::new_v4(),
///     organizer_name: "Stage Co".to_string(),
///     artist_id: Uuid::new_v4(),
///     artist_name: "Asha".to_string(),
///     terms: ContractTerms {
///         event_name: "Jazz Night".to_string(),
///         venue: "Blue Room".to_string(),
///         event_date: NaiveDate::from_ymd_opt(2030, 5, 1),
///         payment_amount: 50000.0,
///         ..Default::default()
///     },
/// }, Utc::now());
///
/// contract.respond(ContractDecision::Accept, Utc::now()).unwrap();
/// assert_eq!(contract.status, ContractStatus::Accepted);
/// assert!(contract.respond(ContractDecision::Reject, Utc::now()).is_err());
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;
use crate::workflow::WorkflowError;

/// Contract status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ContractStatus {
    /// Waiting for the musician's answer
    Pending,

    /// Musician agreed; an event may be created from it
    Accepted,

    /// Musician declined
    Rejected,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Pending => "PENDING",
            ContractStatus::Accepted => "ACCEPTED",
            ContractStatus::Rejected => "REJECTED",
        }
    }

    /// Checks if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContractStatus::Accepted | ContractStatus::Rejected)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: ContractStatus) -> bool {
        matches!(
            (self, target),
            (ContractStatus::Pending, ContractStatus::Accepted)
                | (ContractStatus::Pending, ContractStatus::Rejected)
        )
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_lowercase())
    }
}

impl FromStr for ContractStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ContractStatus::Pending),
            "ACCEPTED" => Ok(ContractStatus::Accepted),
            "REJECTED" => Ok(ContractStatus::Rejected),
            _ => Err(UnknownVariant::new("contract status", s)),
        }
    }
}

impl TryFrom<String> for ContractStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContractStatus> for &'static str {
    fn from(status: ContractStatus) -> Self {
        status.as_str()
    }
}

/// A musician's answer to a pending contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractDecision {
    Accept,
    Reject,
}

impl ContractDecision {
    /// Status the contract ends up in
    pub fn target_status(&self) -> ContractStatus {
        match self {
            ContractDecision::Accept => ContractStatus::Accepted,
            ContractDecision::Reject => ContractStatus::Rejected,
        }
    }
}

impl FromStr for ContractDecision {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "accepted" => Ok(ContractDecision::Accept),
            "reject" | "rejected" => Ok(ContractDecision::Reject),
            _ => Err(UnknownVariant::new("contract decision", s)),
        }
    }
}

/// Body of `PUT /contracts/{id}/status`
///
/// The status is sent uppercase (`ACCEPTED`/`REJECTED`); `accept` and
/// `reject` are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

impl StatusUpdate {
    pub fn new(decision: ContractDecision) -> Self {
        Self {
            status: decision.target_status().as_str().to_string(),
        }
    }

    /// Decision carried by this update
    pub fn decision(&self) -> Result<ContractDecision, UnknownVariant> {
        self.status.parse()
    }
}

/// Body of `PUT /contracts/{id}/link-event`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEvent {
    pub event_id: Uuid,
}

/// Offer terms entered by the organizer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTerms {
    /// Name of the event the musician would play
    #[serde(default)]
    pub event_name: String,

    #[serde(default)]
    pub venue: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,

    /// Free-form start time, e.g. "7:00 PM"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_description: Option<String>,

    /// Payment offered to the musician
    #[serde(default)]
    pub payment_amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Input for creating a contract (`POST /contracts`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub organizer_id: Uuid,

    #[serde(default)]
    pub organizer_name: String,

    pub artist_id: Uuid,

    #[serde(default)]
    pub artist_name: String,

    #[serde(flatten)]
    pub terms: ContractTerms,
}

/// Contract between an organizer and a musician
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,

    pub organizer_id: Uuid,

    #[serde(default)]
    pub organizer_name: String,

    pub artist_id: Uuid,

    #[serde(default)]
    pub artist_name: String,

    /// Event created from this contract, once there is one
    #[serde(default)]
    pub event_id: Option<Uuid>,

    #[serde(flatten)]
    pub terms: ContractTerms,

    pub status: ContractStatus,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contract {
    /// Creates a pending contract from an offer
    pub fn new(id: Uuid, offer: NewContract, now: DateTime<Utc>) -> Self {
        Self {
            id,
            organizer_id: offer.organizer_id,
            organizer_name: offer.organizer_name,
            artist_id: offer.artist_id,
            artist_name: offer.artist_name,
            event_id: None,
            terms: offer.terms,
            status: ContractStatus::Pending,
            created_at: now,
            updated_at: None,
        }
    }

    /// Applies the musician's decision
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTransition` unless the contract is pending.
    pub fn respond(
        &mut self,
        decision: ContractDecision,
        now: DateTime<Utc>,
    ) -> Result<ContractStatus, WorkflowError> {
        let target = decision.target_status();
        if !self.status.can_transition_to(target) {
            return Err(WorkflowError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        tracing::debug!(
            contract_id = %self.id,
            from = ?self.status,
            to = ?target,
            "Contract answered"
        );
        self.status = target;
        self.updated_at = Some(now);
        Ok(target)
    }

    /// Records the event created from this contract
    ///
    /// Linking the same event twice is a no-op, so a client may repeat the
    /// call after the server already linked it during event creation.
    ///
    /// # Errors
    ///
    /// - `ContractNotAccepted` if the contract is not accepted
    /// - `ContractAlreadyLinked` if a different event is already linked
    pub fn link_event(&mut self, event_id: Uuid, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        match self.event_id {
            Some(existing) if existing == event_id => return Ok(()),
            Some(existing) => {
                return Err(WorkflowError::ContractAlreadyLinked {
                    contract_id: self.id,
                    event_id: existing,
                })
            }
            None => {}
        }

        if self.status != ContractStatus::Accepted {
            return Err(WorkflowError::ContractNotAccepted(self.status));
        }

        self.event_id = Some(event_id);
        self.updated_at = Some(now);
        tracing::debug!(contract_id = %self.id, event_id = %event_id, "Linked event to contract");
        Ok(())
    }

    /// Accepted and not linked yet
    pub fn is_open_for_event(&self) -> bool {
        self.status == ContractStatus::Accepted && self.event_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_contract() -> Contract {
        Contract::new(
            Uuid::new_v4(),
            NewContract {
                organizer_id: Uuid::new_v4(),
                organizer_name: "Stage Co".to_string(),
                artist_id: Uuid::new_v4(),
                artist_name: "Asha".to_string(),
                terms: ContractTerms {
                    event_name: "Jazz Night".to_string(),
                    venue: "Blue Room".to_string(),
                    event_date: NaiveDate::from_ymd_opt(2030, 5, 1),
                    payment_amount: 50000.0,
                    ..Default::default()
                },
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_status_transitions() {
        use ContractStatus::*;

        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_respond_only_once() {
        let mut contract = pending_contract();
        assert_eq!(
            contract.respond(ContractDecision::Accept, Utc::now()).unwrap(),
            ContractStatus::Accepted
        );
        assert!(contract.updated_at.is_some());

        let err = contract
            .respond(ContractDecision::Reject, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidTransition {
                from: ContractStatus::Accepted,
                to: ContractStatus::Rejected
            }
        );
        assert_eq!(contract.status, ContractStatus::Accepted);
    }

    #[test]
    fn test_rejected_cannot_be_accepted() {
        let mut contract = pending_contract();
        contract.respond(ContractDecision::Reject, Utc::now()).unwrap();
        assert!(contract.respond(ContractDecision::Accept, Utc::now()).is_err());
        assert_eq!(contract.status, ContractStatus::Rejected);
    }

    #[test]
    fn test_link_requires_acceptance() {
        let mut contract = pending_contract();
        let err = contract.link_event(Uuid::new_v4(), Utc::now()).unwrap_err();
        assert_eq!(err, WorkflowError::ContractNotAccepted(ContractStatus::Pending));
    }

    #[test]
    fn test_link_is_idempotent_for_same_event() {
        let mut contract = pending_contract();
        contract.respond(ContractDecision::Accept, Utc::now()).unwrap();

        let event_id = Uuid::new_v4();
        contract.link_event(event_id, Utc::now()).unwrap();
        contract.link_event(event_id, Utc::now()).unwrap();
        assert_eq!(contract.event_id, Some(event_id));
        assert!(!contract.is_open_for_event());

        let err = contract.link_event(Uuid::new_v4(), Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::ContractAlreadyLinked { .. }));
    }

    #[test]
    fn test_wire_format() {
        let contract = pending_contract();
        let value = serde_json::to_value(&contract).unwrap();

        assert_eq!(value["status"], "PENDING");
        assert_eq!(value["eventName"], "Jazz Night");
        assert_eq!(value["paymentAmount"], 50000.0);
        assert_eq!(value["eventDate"], "2030-05-01");
        assert!(value["eventId"].is_null());

        let decoded: Contract = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, contract);
    }

    #[test]
    fn test_status_update_body() {
        let body = StatusUpdate::new(ContractDecision::Accept);
        assert_eq!(serde_json::to_value(&body).unwrap(), serde_json::json!({"status": "ACCEPTED"}));
        assert_eq!(body.decision().unwrap(), ContractDecision::Accept);

        let lower = StatusUpdate { status: "rejected".to_string() };
        assert_eq!(lower.decision().unwrap(), ContractDecision::Reject);
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!("accept".parse::<ContractDecision>().unwrap(), ContractDecision::Accept);
        assert_eq!("REJECTED".parse::<ContractDecision>().unwrap(), ContractDecision::Reject);
        assert!("maybe".parse::<ContractDecision>().is_err());
    }
}
