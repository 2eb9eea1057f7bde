/// Event model
///
/// An event is a ticketed performance created by an organizer from an
/// accepted contract. It tracks how many tickets remain so that bookings can
/// never oversell it.
///
/// # Invariants
///
/// - `0 <= available_tickets <= total_tickets`
/// - `total_tickets - available_tickets` is the number of tickets booked
///
/// # Lifecycle
///
/// ```text
/// upcoming → completed   (once the event date has passed)
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;
use crate::workflow::{self, WorkflowError};

/// Event status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum EventStatus {
    /// Scheduled, tickets on sale
    #[default]
    Upcoming,

    /// The event date has passed
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "UPCOMING",
            EventStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_lowercase())
    }
}

impl FromStr for EventStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UPCOMING" => Ok(EventStatus::Upcoming),
            "COMPLETED" => Ok(EventStatus::Completed),
            _ => Err(UnknownVariant::new("event status", s)),
        }
    }
}

impl TryFrom<String> for EventStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventStatus> for &'static str {
    fn from(status: EventStatus) -> Self {
        status.as_str()
    }
}

/// Details an organizer enters when creating an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub location: String,

    pub date: NaiveDate,

    /// Free-form start time, e.g. "7:00 PM"
    #[serde(default)]
    pub time: String,

    /// Price per ticket
    #[serde(default)]
    pub price: f64,

    #[serde(default)]
    pub category: String,

    pub total_tickets: u32,
}

/// Input for creating an event (`POST /events`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    #[serde(flatten)]
    pub details: EventDetails,

    pub organizer_id: Uuid,

    #[serde(default)]
    pub organizer_name: String,

    /// Musician performing; must be the artist of `contract_id`
    #[serde(default)]
    pub musician_id: Option<Uuid>,

    #[serde(default)]
    pub musician_name: Option<String>,

    /// Accepted contract this event is created from
    #[serde(default)]
    pub contract_id: Option<Uuid>,
}

/// Ticketed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub location: String,

    pub date: NaiveDate,

    #[serde(default)]
    pub time: String,

    #[serde(default)]
    pub price: f64,

    #[serde(default)]
    pub category: String,

    pub total_tickets: u32,

    pub available_tickets: u32,

    pub organizer_id: Uuid,

    #[serde(default)]
    pub organizer_name: String,

    #[serde(default)]
    pub musician_id: Option<Uuid>,

    #[serde(default)]
    pub musician_name: Option<String>,

    #[serde(default)]
    pub contract_id: Option<Uuid>,

    #[serde(default)]
    pub status: EventStatus,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Creates an upcoming event with every ticket available
    pub fn new(id: Uuid, input: NewEvent, now: DateTime<Utc>) -> Self {
        let details = input.details;
        Self {
            id,
            name: details.name,
            description: details.description,
            location: details.location,
            date: details.date,
            time: details.time,
            price: details.price,
            category: details.category,
            total_tickets: details.total_tickets,
            available_tickets: details.total_tickets,
            organizer_id: input.organizer_id,
            organizer_name: input.organizer_name,
            musician_id: input.musician_id,
            musician_name: input.musician_name,
            contract_id: input.contract_id,
            status: EventStatus::Upcoming,
            created_at: Some(now),
        }
    }

    /// Number of tickets already booked
    pub fn booked_tickets(&self) -> u32 {
        self.total_tickets.saturating_sub(self.available_tickets)
    }

    /// Takes `count` tickets out of the available pool
    ///
    /// # Errors
    ///
    /// - `SoldOut` if nothing is left
    /// - `InsufficientTickets` if fewer than `count` tickets are left
    /// - `Validation` if `count` is zero
    pub fn reserve(&mut self, count: u32) -> Result<u32, WorkflowError> {
        workflow::check_availability(self.available_tickets, count)?;
        self.available_tickets -= count;
        tracing::debug!(
            event_id = %self.id,
            tickets = count,
            remaining = self.available_tickets,
            "Reserved tickets"
        );
        Ok(self.available_tickets)
    }

    /// Whether the event date lies before `today`
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.date < today
    }

    /// Upcoming and not yet in the past
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.status == EventStatus::Upcoming && !self.is_past(today)
    }

    /// Flips the status to completed if the date has passed
    ///
    /// Returns `true` when the status changed; calling it again is a no-op.
    pub fn mark_completed_if_past(&mut self, today: NaiveDate) -> bool {
        if self.is_past(today) && self.status != EventStatus::Completed {
            self.status = EventStatus::Completed;
            true
        } else {
            false
        }
    }

    /// Applies a partial update, keeping the ticket invariant
    ///
    /// Changing `total_tickets` alone shifts `available_tickets` by the same
    /// amount so the number of booked tickets is preserved.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` if the update would leave fewer
    /// total tickets than are already booked, if it names an available count
    /// other than `total - booked`, or if it moves a completed event back to
    /// upcoming.
    pub fn apply_update(&mut self, update: EventUpdate) -> Result<(), WorkflowError> {
        let booked = self.booked_tickets();
        let total = update.total_tickets.unwrap_or(self.total_tickets);

        if total < booked {
            return Err(WorkflowError::Validation(format!(
                "Total tickets cannot drop below the {} already booked",
                booked
            )));
        }

        // Available tickets always follow from total and booked
        let available = total - booked;
        if update.available_tickets.is_some_and(|requested| requested != available) {
            return Err(WorkflowError::Validation(format!(
                "Available tickets must equal total tickets minus the {} already booked ({})",
                booked, available
            )));
        }

        if self.status == EventStatus::Completed && update.status == Some(EventStatus::Upcoming) {
            return Err(WorkflowError::Validation(
                "A completed event cannot be reopened".to_string(),
            ));
        }

        if update.price.is_some_and(|price| price < 0.0) {
            return Err(WorkflowError::Validation(
                "Price cannot be negative".to_string(),
            ));
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(time) = update.time {
            self.time = time;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(status) = update.status {
            self.status = status;
        }

        self.total_tickets = total;
        self.available_tickets = available;
        Ok(())
    }
}

/// Partial event update (`PUT /events/{id}`)
///
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tickets: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tickets: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
}

impl EventUpdate {
    /// Update that only marks the event completed
    pub fn completed() -> Self {
        Self {
            status: Some(EventStatus::Completed),
            ..Default::default()
        }
    }
}
