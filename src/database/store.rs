//! Store abstraction
//!
//! The marketplace reads and writes its collections through [`Store`]:
//! create / find / find-by-id / update-by-id per collection, with the owner
//! field queryable. [`PgStore`](super::postgres::PgStore) backs it with
//! PostgreSQL; [`MemoryStore`](super::memory::MemoryStore) keeps everything in
//! process for tests and database-less development.
//!
//! Updates are last-write-wins; the store gives no ordering guarantees between
//! concurrent requests touching the same record.

use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::{
    Booking, Guide, GuideBooking, GuideUpdate, NewBooking, NewGuide, NewGuideBooking, NewUser, Place, PlaceFields, User,
};
use crate::types::{GuideBookingId, GuideId, PlaceId, UserId};

#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness rule was violated
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub const EMAIL_TAKEN: &str = "An account with this email address already exists";
pub const GUIDE_EMAIL_TAKEN: &str = "A guide profile with this email address already exists";
pub const GUIDE_EXISTS: &str = "This account already has a guide profile";

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the health endpoint
    async fn health_check(&self) -> StoreResult<()>;

    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn create_place(&self, owner: UserId, fields: PlaceFields) -> StoreResult<Place>;
    async fn find_place(&self, id: PlaceId) -> StoreResult<Option<Place>>;
    async fn list_places(&self) -> StoreResult<Vec<Place>>;
    async fn list_places_by_owner(&self, owner: UserId) -> StoreResult<Vec<Place>>;
    /// Replace the editable fields; `None` when the place does not exist
    async fn update_place(&self, id: PlaceId, fields: PlaceFields) -> StoreResult<Option<Place>>;

    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking>;
    async fn list_bookings_by_user(&self, user: UserId) -> StoreResult<Vec<Booking>>;

    async fn create_guide(&self, guide: NewGuide) -> StoreResult<Guide>;
    async fn find_guide(&self, id: GuideId) -> StoreResult<Option<Guide>>;
    async fn find_guide_by_email(&self, email: &str) -> StoreResult<Option<Guide>>;
    async fn find_guide_by_owner(&self, owner: UserId) -> StoreResult<Option<Guide>>;
    async fn list_guides(&self) -> StoreResult<Vec<Guide>>;
    /// Apply an update; `None` when the guide does not exist
    async fn update_guide(&self, id: GuideId, update: GuideUpdate) -> StoreResult<Option<Guide>>;

    async fn create_guide_booking(&self, booking: NewGuideBooking) -> StoreResult<GuideBooking>;
    async fn find_guide_booking(&self, id: GuideBookingId) -> StoreResult<Option<GuideBooking>>;
    async fn list_guide_bookings_by_user(&self, user: UserId) -> StoreResult<Vec<GuideBooking>>;
    async fn list_guide_bookings_by_guide(&self, guide: GuideId) -> StoreResult<Vec<GuideBooking>>;
}
