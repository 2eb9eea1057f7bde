//! # Encore Client
//!
//! Client side of the Encore marketplace: everything between a front end and
//! the REST backend.
//!
//! ## Modules
//!
//! - `config`: Client settings (API URL, timeout, data directory, fallback)
//! - `error`: Client error taxonomy
//! - `storage`: Key-value persistence (file-backed and in-memory)
//! - `session`: Logged-in user and token, persisted and observable
//! - `gateway`: HTTP client for the REST API
//! - `local`: Fallback backend over the key-value store
//! - `backend`: The `Backend` trait both of the above implement, and selection
//! - `workflow`: Contract → event → booking orchestration and dashboards
//!
//! ## Example
//!
//! ```no_run
//! use encore_client::{backend, config::ClientConfig, session::Session, storage};
//! use encore_client::workflow::Marketplace;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::load()?;
//! let store = storage::open(&config)?;
//! let session = Session::restore(store.clone())?;
//! let backend = backend::connect(&config, store, session.clone()).await?;
//!
//! let market = Marketplace::new(backend, session);
//! market.login("user@example.com", "password").await?;
//! for event in market.upcoming_events().await? {
//!     println!("{} on {}", event.name, event.date);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod local;
pub mod session;
pub mod storage;
pub mod workflow;

pub use error::{ClientError, ClientResult};
