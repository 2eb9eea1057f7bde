/// Contract endpoints
///
/// # Endpoints
///
/// - `POST /api/contracts` - Send a contract to a musician (organizers)
/// - `GET /api/contracts/artist/:id` - Contracts addressed to a musician
/// - `GET /api/contracts/artist/:id/pending` - Unanswered contracts of a musician
/// - `GET /api/contracts/organizer/:id` - Contracts sent by an organizer
/// - `GET /api/contracts/:id` - One contract (either party)
/// - `PUT /api/contracts/:id/status` - Accept or reject (the addressed musician)
/// - `PUT /api/contracts/:id/link-event` - Link an event (the organizer)
///
/// Contract lists are private to the parties: each list route only answers
/// for the caller's own id.

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
use encore_shared::models::{Contract, LinkEvent, NewContract, StatusUpdate};
use uuid::Uuid;

/// Send a contract
///
/// ```text
/// POST /api/contracts
///
/// {
///   "organizerId": "uuid",
///   "artistId": "uuid",
///   "eventName": "Jazz Night",
///   "venue": "Blue Room",
///   "eventDate": "2030-05-01",
///   "eventTime": "8:00 PM",
///   "paymentAmount": 50000,
///   "notes": "Two sets"
/// }
/// ```
///
/// The organizer is always the caller; names are filled in by the server.
pub async fn create_contract(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(offer): Json<NewContract>,
) -> ApiResult<(StatusCode, Json<Contract>)> {
    let organizer = auth.user(&state.store).await?;
    let contract = state.store.create_contract(&organizer, offer).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn artist_contracts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(artist_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Contract>>> {
    auth.ensure_self(artist_id)?;
    Ok(Json(state.store.contracts_for_artist(artist_id).await))
}

pub async fn pending_contracts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(artist_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Contract>>> {
    auth.ensure_self(artist_id)?;
    Ok(Json(state.store.pending_contracts_for_artist(artist_id).await))
}

pub async fn organizer_contracts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(organizer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Contract>>> {
    auth.ensure_self(organizer_id)?;
    Ok(Json(state.store.contracts_for_organizer(organizer_id).await))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .store
        .contract(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Contract {} not found", id)))?;

    if auth.user_id != contract.organizer_id && auth.user_id != contract.artist_id {
        return Err(ApiError::Forbidden(
            "Not a party to this contract".to_string(),
        ));
    }

    Ok(Json(contract))
}

/// Accept or reject a contract
///
/// ```text
/// PUT /api/contracts/:id/status
///
/// { "status": "ACCEPTED" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Status is neither accepted nor rejected
/// - `403 Forbidden`: Caller is not the addressed musician
/// - `409 Conflict`: Contract was already answered
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<Contract>> {
    let decision = update
        .decision()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let caller = auth.user(&state.store).await?;
    Ok(Json(
        state.store.respond_to_contract(&caller, id, decision).await?,
    ))
}

/// Link an event to an accepted contract
///
/// ```text
/// PUT /api/contracts/:id/link-event
///
/// { "eventId": "uuid" }
/// ```
///
/// Linking the event the contract already points at succeeds unchanged.
pub async fn link_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<LinkEvent>,
) -> ApiResult<Json<Contract>> {
    let caller = auth.user(&state.store).await?;
    Ok(Json(state.store.link_event(&caller, id, body.event_id).await?))
}
