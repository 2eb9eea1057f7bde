/// Booking model
///
/// A booking is an attendee's reservation of one or more tickets to an event.
/// It is issued once, carries an opaque QR code, and is never modified
/// afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Event, UnknownVariant};

/// Booking status
///
/// Cancellation is not offered, so every booking is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BookingStatus {
    #[default]
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_lowercase())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            _ => Err(UnknownVariant::new("booking status", s)),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BookingStatus> for &'static str {
    fn from(status: BookingStatus) -> Self {
        status.as_str()
    }
}

/// Booking request body (`POST /bookings`)
///
/// `user_id` and `user_name` are informational: the server books for the
/// authenticated caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub event_id: Uuid,

    pub tickets: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Confirmed ticket reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,

    pub user_id: Uuid,

    #[serde(default)]
    pub user_name: String,

    pub event_id: Uuid,

    pub tickets: u32,

    /// Opaque unique code shown at the door
    pub qr_code: String,

    #[serde(default)]
    pub status: BookingStatus,

    pub booking_date: DateTime<Utc>,
}

impl Booking {
    /// Issues a confirmed booking with a fresh QR code
    ///
    /// Callers must have reserved the tickets on the event first.
    pub fn issue(
        user_id: Uuid,
        user_name: impl Into<String>,
        event_id: Uuid,
        tickets: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            user_name: user_name.into(),
            event_id,
            tickets,
            qr_code: qr_code(event_id),
            status: BookingStatus::Confirmed,
            booking_date: now,
        }
    }
}

/// Generates a QR code token: `QR-<random>-<event id>`
pub fn qr_code(event_id: Uuid) -> String {
    format!("QR-{}-{}", Uuid::new_v4().simple(), event_id)
}

/// What an attendee shows at the door
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPass {
    pub booking_id: Uuid,

    pub event_id: Uuid,

    pub event_name: String,

    pub ticket_count: u32,

    /// Total paid: ticket price times count
    pub price: f64,

    pub qr_code: String,

    pub date: NaiveDate,
}

impl TicketPass {
    pub fn new(booking: &Booking, event: &Event) -> Self {
        Self {
            booking_id: booking.id,
            event_id: event.id,
            event_name: event.name.clone(),
            ticket_count: booking.tickets,
            price: event.price * f64::from(booking.tickets),
            qr_code: booking.qr_code.clone(),
            date: event.date,
        }
    }
}
