//! Typed path parameter helpers.

use std::str::FromStr;

use parking_core::error::AppError;
use parking_core::types::id::{SlotId, SpaceId};

fn parse_id<T: FromStr>(label: &str, raw: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::validation(format!("Invalid {label}: {raw}")))
}

/// Parses a slot ID from a path segment.
pub fn parse_slot_id(raw: &str) -> Result<SlotId, AppError> {
    parse_id("slot ID", raw)
}

/// Parses a space ID from a path segment.
pub fn parse_space_id(raw: &str) -> Result<SpaceId, AppError> {
    parse_id("space ID", raw)
}
