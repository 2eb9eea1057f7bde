/// Event endpoints
///
/// # Endpoints
///
/// - `GET /api/events` - All events
/// - `POST /api/events` - Create an event from an accepted contract (organizers)
/// - `GET /api/events/upcoming` - Upcoming events dated today or later
/// - `GET /api/events/organizer/:id` - Events of one organizer
/// - `GET /api/events/:id` - One event
/// - `PUT /api/events/:id` - Partial update (the event's organizer)
/// - `DELETE /api/events/:id` - Delete an event without bookings (the event's organizer)
///
/// Creating an event links its contract in the same step, so the contract's
/// `eventId` is already set when the response arrives.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthContext,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use encore_shared::models::{Event, EventUpdate, NewEvent};
use uuid::Uuid;

pub async fn list_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.store.events().await)
}

pub async fn upcoming_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.store.upcoming_events(Utc::now().date_naive()).await)
}

pub async fn organizer_events(
    State(state): State<AppState>,
    Path(organizer_id): Path<Uuid>,
) -> Json<Vec<Event>> {
    Json(state.store.events_for_organizer(organizer_id).await)
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    state
        .store
        .event(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Event {} not found", id)))
}

/// Create an event
///
/// ```text
/// POST /api/events
///
/// {
///   "name": "Jazz Night",
///   "location": "Blue Room",
///   "date": "2030-05-01",
///   "time": "8:00 PM",
///   "price": 800,
///   "category": "Jazz",
///   "totalTickets": 100,
///   "organizerId": "uuid",
///   "contractId": "uuid"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing contract, contract not accepted, invalid details
/// - `403 Forbidden`: Caller is not the contract's organizer
/// - `409 Conflict`: Contract already linked to an event
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<NewEvent>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let organizer = auth.user(&state.store).await?;
    let event = state.store.create_event(&organizer, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<EventUpdate>,
) -> ApiResult<Json<Event>> {
    let caller = auth.user(&state.store).await?;
    Ok(Json(state.store.update_event(&caller, id, update).await?))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let caller = auth.user(&state.store).await?;
    state.store.delete_event(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
