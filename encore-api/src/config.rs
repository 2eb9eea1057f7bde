/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `RUST_ENV`: `production` enables HSTS
/// - `RUST_LOG`: Log filter (default: `encore_api=debug,tower_http=debug`)
///
/// # Example
///
/// ```no_run
/// use encore_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Minimum length of the JWT signing secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is missing or too short, or if
    /// `API_PORT` is not a valid port.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_SECRET_LENGTH
            );
        }

        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into()));

        let production = env::var("RUST_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            jwt: JwtConfig { secret: jwt_secret },
        })
    }

    /// Development configuration bound to `127.0.0.1` with the given port
    ///
    /// Port `0` asks the OS for an ephemeral port.
    pub fn local(port: u16, jwt_secret: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            jwt: JwtConfig {
                secret: jwt_secret.into(),
            },
        }
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
