/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new account and sign in
/// - `POST /api/auth/login` - Sign in with email and password
///
/// Both return the same body: a bearer token plus the user record.
///
/// ```json
/// {
///   "token": "eyJ...",
///   "id": "uuid",
///   "name": "Asha Rao",
///   "email": "asha@example.com",
///   "role": "MUSICIAN",
///   "profile": { "genre": "Jazz" }
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use encore_shared::{
    auth::{jwt, password},
    models::{AuthResponse, LoginRequest, RegisterRequest, User},
};
use uuid::Uuid;
use validator::Validate;

/// Register a new user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Invalid name, email, password or profile
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let profile = req.profile().map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "profile".to_string(),
            message: format!("Invalid profile: {}", e),
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        profile,
        created_at: Some(Utc::now()),
    };
    let user = state.store.insert_user(user, password_hash).await?;

    let token = issue_token(&state, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(token, &user))))
}

/// Login endpoint
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Malformed email or empty password
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let credentials = state.store.find_by_email(&req.email).await.ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &credentials.password_hash)? {
        tracing::info!(user_id = %credentials.user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let token = issue_token(&state, &credentials.user)?;
    tracing::info!(user_id = %credentials.user.id, "User logged in");
    Ok(Json(AuthResponse::new(token, &credentials.user)))
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let claims = jwt::Claims::new(user.id, user.email.clone(), user.role());
    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}
