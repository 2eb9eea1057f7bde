/// User directory endpoints
///
/// - `GET /api/users/artists` - Musicians organizers can send contracts to
/// - `GET /api/users/organizers` - Organizers
/// - `GET /api/users/:id` - One user
///
/// Passwords never leave the store; these handlers return [`User`] records.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use encore_shared::models::{Role, User};
use uuid::Uuid;

pub async fn list_artists(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.store.users_by_role(Role::Musician).await)
}

pub async fn list_organizers(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.store.users_by_role(Role::Organizer).await)
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    state
        .store
        .user(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
}
