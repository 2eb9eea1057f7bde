//! # Encore API Server Library
//!
//! Reference REST backend for the Encore marketplace. It owns the
//! authoritative copy of users, contracts, events and bookings, and is where
//! ticket availability is checked and decremented atomically.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Authentication context and security headers
//! - `routes`: API route handlers
//! - `store`: In-memory marketplace store

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod store;
