//! Identifier types shared across the API, the store and the auth layer.
//!
//! Every entity id is a [`Uuid`]. Ids arrive as strings (path segments, JSON
//! bodies, multipart fields, JWT `sub` claims) and are parsed into their
//! canonical form at the boundary, so equality checks such as ownership never
//! compare ad hoc string renderings.

use uuid::Uuid;

use crate::errors::ApiError;

pub type UserId = Uuid;
pub type PlaceId = Uuid;
pub type BookingId = Uuid;
pub type GuideId = Uuid;
pub type GuideBookingId = Uuid;

/// Parse an identifier received from a client.
///
/// Surrounding whitespace and letter case are not significant: the hyphenated,
/// simple and braced renderings of the same UUID all resolve to one value.
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::validation(field, format!("{field} is not a valid id")))
}
