/// User model, roles and role-specific profiles
///
/// A user is exactly one of three things: an attendee who books tickets, an
/// organizer who sends contracts and creates events, or a musician who answers
/// contracts and performs. The role is not stored separately from the profile:
/// it is the variant of [`Profile`], so code that needs role-specific data has
/// to match on it.
///
/// # Wire Format
///
/// ```json
/// {
///   "id": "5a7c...",
///   "name": "Asha Rao",
///   "email": "asha@example.com",
///   "role": "MUSICIAN",
///   "profile": { "genre": "Jazz", "location": "Bangalore", "price": 25000 }
/// }
/// ```
///
/// Roles are sent uppercase and parsed case-insensitively. Some backends send
/// `profile` as a JSON-encoded string instead of an object; both are accepted.
///
/// # Example
///
/// ```
/// use encore_shared::models::user::{MusicianProfile, Profile, Role, User};
/// use uuid::Uuid;
///
/// let user = User {
///     id: Uuid::new_v4(),
///     name: "Asha Rao".to_string(),
///     email: "asha@example.com".to_string(),
///     profile: Profile::Musician(MusicianProfile {
///         genre: Some("Jazz".to_string()),
///         ..Default::default()
///     }),
///     created_at: None,
/// };
///
/// assert_eq!(user.role(), Role::Musician);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::UnknownVariant;

/// Marketplace role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Role {
    /// Attendee who books tickets
    User,

    /// Creates events and sends contracts
    Organizer,

    /// Performer who accepts or rejects contracts
    Musician,
}

impl Role {
    /// Wire representation (uppercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Organizer => "ORGANIZER",
            Role::Musician => "MUSICIAN",
        }
    }

    /// Human-facing lowercase label
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Organizer => "organizer",
            Role::Musician => "musician",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" | "ATTENDEE" => Ok(Role::User),
            "ORGANIZER" => Ok(Role::Organizer),
            "MUSICIAN" | "ARTIST" => Ok(Role::Musician),
            _ => Err(UnknownVariant::new("role", s)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for &'static str {
    fn from(role: Role) -> Self {
        role.as_str()
    }
}

/// Profile details a musician fills in at registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicianProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    /// Asking price per performance
    #[serde(
        default,
        deserialize_with = "super::lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,

    #[serde(
        default,
        deserialize_with = "super::lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<f64>,

    /// Keys this client does not know about, kept so they survive a round trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Profile details an organizer fills in at registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerProfile {
    /// Kind of organizer (venue, agency, festival, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialties: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Role-specific profile; the variant *is* the user's role
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    /// Attendees carry no profile data
    Attendee,
    Organizer(OrganizerProfile),
    Musician(MusicianProfile),
}

impl Profile {
    /// Role implied by this profile
    pub fn role(&self) -> Role {
        match self {
            Profile::Attendee => Role::User,
            Profile::Organizer(_) => Role::Organizer,
            Profile::Musician(_) => Role::Musician,
        }
    }

    /// Empty profile for a role
    pub fn empty(role: Role) -> Self {
        match role {
            Role::User => Profile::Attendee,
            Role::Organizer => Profile::Organizer(OrganizerProfile::default()),
            Role::Musician => Profile::Musician(MusicianProfile::default()),
        }
    }

    /// Builds a profile from a role and a free-form profile value
    ///
    /// `value` may be absent, `null`, an object, or a string holding a JSON
    /// object. Attendee profiles ignore the value entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object (or a string that
    /// decodes to one) with the expected field types.
    pub fn from_parts(role: Role, value: Option<Value>) -> Result<Self, serde_json::Error> {
        let value = match value {
            None | Some(Value::Null) => return Ok(Profile::empty(role)),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(Profile::empty(role)),
            Some(Value::String(s)) => serde_json::from_str::<Value>(&s)?,
            Some(v) => v,
        };

        match role {
            Role::User => Ok(Profile::Attendee),
            Role::Organizer => Ok(Profile::Organizer(serde_json::from_value(value)?)),
            Role::Musician => Ok(Profile::Musician(serde_json::from_value(value)?)),
        }
    }

    /// Free-form wire value (None for attendees)
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Profile::Attendee => None,
            Profile::Organizer(p) => serde_json::to_value(p).ok(),
            Profile::Musician(p) => serde_json::to_value(p).ok(),
        }
    }
}

/// User account as seen by clients (never carries a password)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UserRecord", into = "UserRecord")]
pub struct User {
    pub id: Uuid,

    pub name: String,

    pub email: String,

    pub profile: Profile,

    /// When the account was created (not every backend reports it)
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Role derived from the profile variant
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    /// Name shown on bookings and contracts, falling back to the email
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// Flat wire shape of a [`User`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,

    pub name: String,

    pub email: String,

    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRecord> for User {
    type Error = serde_json::Error;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        Ok(User {
            id: record.id,
            name: record.name,
            email: record.email,
            profile: Profile::from_parts(record.role, record.profile)?,
            created_at: record.created_at,
        })
    }
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        UserRecord {
            id: user.id,
            role: user.role(),
            profile: user.profile.to_value(),
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Registration request body (`POST /auth/register`)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password (hashed by the receiving backend)
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Requested role
    pub role: Role,

    /// Role-specific profile, sent as a nested JSON object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
}

impl RegisterRequest {
    /// Builds a request whose role and profile come from one [`Profile`]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        profile: &Profile,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: profile.role(),
            profile: profile.to_value(),
        }
    }

    /// Decodes the typed profile for the requested role
    pub fn profile(&self) -> Result<Profile, serde_json::Error> {
        Profile::from_parts(self.role, self.profile.clone())
    }
}

/// Login request body (`POST /auth/login`)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response of both register and login: a bearer token plus the user record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,

    pub id: Uuid,

    pub name: String,

    pub email: String,

    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
}

impl AuthResponse {
    pub fn new(token: String, user: &User) -> Self {
        Self {
            token,
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role(),
            profile: user.profile.to_value(),
        }
    }

    /// Typed user carried by this response
    pub fn user(&self) -> Result<User, serde_json::Error> {
        Ok(User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            profile: Profile::from_parts(self.role, self.profile.clone())?,
            created_at: None,
        })
    }
}
