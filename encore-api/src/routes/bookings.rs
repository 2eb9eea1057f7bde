/// Booking endpoints
///
/// # Endpoints
///
/// - `POST /api/bookings` - Book tickets (attendees only)
/// - `GET /api/bookings/user/:id` - The caller's own bookings
/// - `GET /api/bookings/event/:id` - Bookings of an event (its organizer)
/// - `GET /api/bookings/:id` - One booking (its attendee or the event's organizer)

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
use encore_shared::models::{Booking, BookingRequest};
use uuid::Uuid;

/// Book tickets
///
/// ```text
/// POST /api/bookings
///
/// { "eventId": "uuid", "tickets": 2 }
/// ```
///
/// Tickets are booked for the authenticated caller; `userId` and `userName`
/// in the body are ignored.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an attendee
/// - `404 Not Found`: Unknown event
/// - `409 Conflict`: Sold out, or fewer tickets left than requested
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<BookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let caller = auth.user(&state.store).await?;
    let booking = state.store.book(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn user_bookings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Booking>>> {
    auth.ensure_self(user_id)?;
    Ok(Json(state.store.bookings_for_user(user_id).await))
}

pub async fn event_bookings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Booking>>> {
    let event = state
        .store
        .event(event_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Event {} not found", event_id)))?;
    auth.ensure_self(event.organizer_id)?;

    Ok(Json(state.store.bookings_for_event(event_id).await))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Booking>> {
    let booking = state
        .store
        .booking(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Booking {} not found", id)))?;

    if booking.user_id != auth.user_id {
        let organizer_id = state.store.event(booking.event_id).await.map(|e| e.organizer_id);
        if organizer_id != Some(auth.user_id) {
            return Err(ApiError::Forbidden(
                "Not authorized to view this booking".to_string(),
            ));
        }
    }

    Ok(Json(booking))
}
