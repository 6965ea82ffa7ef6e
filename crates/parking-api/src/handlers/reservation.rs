//! Slot reservation handlers: reserve, release, book, lookup.

use axum::Json;
use axum::extract::{Path, State};

use parking_core::error::AppError;
use parking_reservation::coordinator::{BookRequest, ReleaseRequest, ReserveRequest};

use crate::dto::request::{BookSlotRequest, ReleaseSlotRequest, ReserveSlotRequest};
use crate::dto::response::{ApiResponse, BookingResponse, ReservationResponse};
use crate::extractors::ValidatedJson;
use crate::extractors::path::parse_slot_id;
use crate::state::AppState;

/// POST /api/slots/{slotId}/reserve
pub async fn reserve_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
    ValidatedJson(req): ValidatedJson<ReserveSlotRequest>,
) -> Result<Json<ApiResponse<ReservationResponse>>, AppError> {
    let slot_id = parse_slot_id(&slot_id)?;
    let ttl = state
        .config
        .reservation
        .ttl_from_minutes(req.reservation_timeout_minutes)?;

    let reservation = state
        .coordinator
        .reserve(ReserveRequest {
            slot_id,
            space_id: req.space_id,
            user_id: req.user_id,
            user_name: req.user_name,
            ttl: Some(ttl),
        })
        .await?;

    Ok(Json(ApiResponse::ok(reservation.into())))
}

/// POST /api/slots/{slotId}/release
pub async fn release_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
    ValidatedJson(req): ValidatedJson<ReleaseSlotRequest>,
) -> Result<Json<ApiResponse<ReservationResponse>>, AppError> {
    let slot_id = parse_slot_id(&slot_id)?;

    let released = state
        .coordinator
        .release(ReleaseRequest {
            slot_id,
            space_id: req.space_id,
            user_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::ok(released.into())))
}

/// POST /api/slots/{slotId}/book
pub async fn book_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
    ValidatedJson(req): ValidatedJson<BookSlotRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let slot_id = parse_slot_id(&slot_id)?;

    let confirmation = state
        .coordinator
        .book(BookRequest {
            slot_id,
            space_id: req.space_id,
            user_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::ok(confirmation.into())))
}

/// GET /api/slots/{slotId}/reservation
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
) -> Result<Json<ApiResponse<ReservationResponse>>, AppError> {
    let slot_id = parse_slot_id(&slot_id)?;

    let reservation = state
        .coordinator
        .reservation(slot_id)
        .ok_or_else(|| AppError::not_found(format!("Slot {slot_id} has no active reservation")))?;

    Ok(Json(ApiResponse::ok(reservation.into())))
}
