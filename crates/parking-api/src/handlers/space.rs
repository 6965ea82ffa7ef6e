//! Space availability handler.

use axum::Json;
use axum::extract::{Path, State};

use parking_core::error::AppError;
use parking_core::events::{SlotAction, SpaceAvailabilitySummary};

use crate::dto::response::ApiResponse;
use crate::extractors::path::parse_space_id;
use crate::state::AppState;

/// GET /api/spaces/{spaceId}/availability
pub async fn space_availability(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> Result<Json<ApiResponse<SpaceAvailabilitySummary>>, AppError> {
    let space_id = parse_space_id(&space_id)?;
    let summary = state
        .coordinator
        .space_summary(space_id, SlotAction::AvailabilityUpdate)
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}
