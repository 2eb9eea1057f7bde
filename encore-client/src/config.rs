/// Client configuration
///
/// Settings are layered with the `config` crate, later sources winning:
///
/// 1. Built-in defaults
/// 2. An optional `encore.toml` (or the file passed with `--config`)
/// 3. `ENCORE_*` environment variables (after `dotenvy::dotenv()`)
///
/// # Settings
///
/// - `api_url` / `ENCORE_API_URL`: Base URL of the REST API
///   (default: `http://localhost:8080/api`)
/// - `timeout_secs` / `ENCORE_TIMEOUT_SECS`: Per-request timeout (default: 10)
/// - `data_dir` / `ENCORE_DATA_DIR`: Where the session and the fallback store
///   are kept (default: `.encore`)
/// - `offline_fallback` / `ENCORE_OFFLINE_FALLBACK`: Use the local store when
///   the API is unreachable (default: true)
///
/// # Example
///
/// ```no_run
/// use encore_client::config::ClientConfig;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = ClientConfig::load()?;
/// println!("Talking to {}", config.api_url);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DATA_DIR: &str = ".encore";

/// Name of the optional settings file (any extension `config` understands)
const SETTINGS_FILE: &str = "encore";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API, including the `/api` prefix
    pub api_url: String,

    pub timeout_secs: u64,

    /// Directory holding the persisted session and fallback data
    pub data_dir: PathBuf,

    /// Switch to the local store when the API cannot be reached
    pub offline_fallback: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            offline_fallback: true,
        }
    }
}

impl ClientConfig {
    /// Loads defaults, `encore.toml` if present, and `ENCORE_*` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Like [`ClientConfig::load`], reading `file` instead of `encore.toml`
    ///
    /// An explicitly named file must exist.
    pub fn load_from(file: Option<&str>) -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let file_source = match file {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name(SETTINGS_FILE).required(false),
        };

        config::Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("offline_fallback", true)?
            .add_source(file_source)
            .add_source(config::Environment::with_prefix("ENCORE").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Configuration for a specific API with every other setting defaulted
    pub fn for_api(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// API URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
