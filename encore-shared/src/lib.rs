//! # Encore Shared Library
//!
//! This crate contains the domain types and business rules shared by the
//! Encore API server and the Encore client.
//!
//! ## Module Organization
//!
//! - `models`: Users, contracts, events and bookings as they travel over the wire
//! - `workflow`: The contract → event → booking rules every backend enforces
//! - `auth`: Password hashing, JWT tokens and local credential digests

pub mod auth;
pub mod models;
pub mod workflow;

pub use workflow::WorkflowError;

/// Current version of the Encore shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
