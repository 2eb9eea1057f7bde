/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use encore_api::{app::{build_router, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{auth::AuthContext, security::SecurityHeadersLayer},
    store::MarketStore,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use encore_shared::auth::jwt;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Marketplace data
    pub store: Arc<MarketStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates state with an empty store
    pub fn new(config: Config) -> Self {
        Self::with_store(Arc::new(MarketStore::new()), config)
    }

    pub fn with_store(store: Arc<MarketStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /health                                GET   (public)
/// /api/auth/register                     POST  (public)
/// /api/auth/login                        POST  (public)
/// /api/users/artists                     GET
/// /api/users/organizers                  GET
/// /api/users/:id                         GET
/// /api/events                            GET, POST
/// /api/events/upcoming                   GET
/// /api/events/organizer/:id              GET
/// /api/events/:id                        GET, PUT, DELETE
/// /api/bookings                          POST
/// /api/bookings/user/:id                 GET
/// /api/bookings/event/:id                GET
/// /api/bookings/:id                      GET
/// /api/contracts                         POST
/// /api/contracts/artist/:id              GET
/// /api/contracts/artist/:id/pending      GET
/// /api/contracts/organizer/:id           GET
/// /api/contracts/:id                     GET
/// /api/contracts/:id/status              PUT
/// /api/contracts/:id/link-event          PUT
/// ```
///
/// Everything under `/api` except `/api/auth` requires a bearer token.
///
/// # Middleware Stack
///
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. JWT authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let user_routes = Router::new()
        .route("/artists", get(routes::users::list_artists))
        .route("/organizers", get(routes::users::list_organizers))
        .route("/:id", get(routes::users::get_user));

    let event_routes = Router::new()
        .route(
            "/",
            get(routes::events::list_events).post(routes::events::create_event),
        )
        .route("/upcoming", get(routes::events::upcoming_events))
        .route("/organizer/:id", get(routes::events::organizer_events))
        .route(
            "/:id",
            get(routes::events::get_event)
                .put(routes::events::update_event)
                .delete(routes::events::delete_event),
        );

    let booking_routes = Router::new()
        .route("/", post(routes::bookings::create_booking))
        .route("/user/:id", get(routes::bookings::user_bookings))
        .route("/event/:id", get(routes::bookings::event_bookings))
        .route("/:id", get(routes::bookings::get_booking));

    let contract_routes = Router::new()
        .route("/", post(routes::contracts::create_contract))
        .route("/artist/:id", get(routes::contracts::artist_contracts))
        .route(
            "/artist/:id/pending",
            get(routes::contracts::pending_contracts),
        )
        .route(
            "/organizer/:id",
            get(routes::contracts::organizer_contracts),
        )
        .route("/:id", get(routes::contracts::get_contract))
        .route("/:id/status", put(routes::contracts::update_status))
        .route("/:id/link-event", put(routes::contracts::link_event));

    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/events", event_routes)
        .nest("/bookings", booking_routes)
        .nest("/contracts", contract_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token from the Authorization header,
/// then injects `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext::from_claims(claims));

    Ok(next.run(req).await)
}
