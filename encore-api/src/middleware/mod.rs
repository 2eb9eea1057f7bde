/// Middleware modules for the API server
///
/// - `auth`: Authenticated caller context inserted by the JWT layer
/// - `security`: Security response headers

pub mod auth;
pub mod security;
