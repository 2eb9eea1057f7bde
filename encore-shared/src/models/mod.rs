/// Domain models for Encore
///
/// Every model serializes with camelCase keys, and every enum is written in
/// uppercase (`PENDING`, `ORGANIZER`, ...) and parsed case-insensitively, so
/// payloads from the API server and the local fallback store look the same.
///
/// # Models
///
/// - `user`: Accounts, roles and role-specific profiles
/// - `contract`: Performance offers from organizers to musicians
/// - `event`: Ticketed events created from accepted contracts
/// - `booking`: Ticket reservations made by attendees

pub mod booking;
pub mod contract;
pub mod event;
pub mod user;

pub use booking::{Booking, BookingRequest, BookingStatus, TicketPass};
pub use contract::{
    Contract, ContractDecision, ContractStatus, ContractTerms, LinkEvent, NewContract, StatusUpdate,
};
pub use event::{Event, EventDetails, EventStatus, EventUpdate, NewEvent};
pub use user::{
    AuthResponse, LoginRequest, MusicianProfile, OrganizerProfile, Profile, RegisterRequest,
    Role, User,
};

/// Error returned when a wire value does not name a known enum variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    /// Which enum was being parsed (e.g. "role")
    pub kind: &'static str,

    /// The value that failed to parse
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Accepts a number or a numeric string.
///
/// Form-backed clients send prices as strings; the server sends numbers.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Priced {
        #[serde(default, deserialize_with = "lenient_f64")]
        price: Option<f64>,
    }

    #[test]
    fn test_lenient_f64_accepts_numbers_and_strings() {
        let p: Priced = serde_json::from_str(r#"{"price": 1500}"#).unwrap();
        assert_eq!(p.price, Some(1500.0));

        let p: Priced = serde_json::from_str(r#"{"price": "1200.5"}"#).unwrap();
        assert_eq!(p.price, Some(1200.5));

        let p: Priced = serde_json::from_str(r#"{"price": ""}"#).unwrap();
        assert_eq!(p.price, None);

        let p: Priced = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.price, None);
    }

    #[test]
    fn test_lenient_f64_rejects_garbage() {
        assert!(serde_json::from_str::<Priced>(r#"{"price": "cheap"}"#).is_err());
        assert!(serde_json::from_str::<Priced>(r#"{"price": true}"#).is_err());
    }
}
