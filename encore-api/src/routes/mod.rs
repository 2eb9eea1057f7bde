/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `users`: Artist and organizer directories, user lookup
/// - `events`: Event listing, creation and maintenance
/// - `bookings`: Ticket booking and booking lookup
/// - `contracts`: Contract offers, responses and event linking

pub mod auth;
pub mod bookings;
pub mod contracts;
pub mod events;
pub mod health;
pub mod users;
