// Database Models
//
// Records for every collection in the marketplace, plus the input shapes the
// store accepts. JSON renderings use camelCase and `_id` for identifiers, which
// is what the single-page frontend consumes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

use crate::auth::models::PublicUser;
use crate::auth::ownership::Owned;
use crate::types::{BookingId, GuideBookingId, GuideId, PlaceId, UserId};

/// Trait for converting from tokio-postgres Row
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error>
    where
        Self: Sized;
}

// ============================================================================
// USERS
// ============================================================================

/// User account. The password hash never leaves the server; clients see
/// [`PublicUser`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl FromRow for User {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// ============================================================================
// PLACES
// ============================================================================

/// Property listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(rename = "_id")]
    pub id: PlaceId,
    pub owner: UserId,
    pub title: String,
    pub address: String,
    pub photos: Vec<String>,
    pub description: String,
    pub perks: Vec<String>,
    pub extra_info: String,
    pub check_in: String,
    pub check_out: String,
    pub max_guests: i32,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Place {
    const RESOURCE: &'static str = "place";

    fn owner(&self) -> UserId {
        self.owner
    }
}

impl FromRow for Place {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            address: row.try_get("address")?,
            photos: row.try_get("photos")?,
            description: row.try_get("description")?,
            perks: row.try_get("perks")?,
            extra_info: row.try_get("extra_info")?,
            check_in: row.try_get("check_in")?,
            check_out: row.try_get("check_out")?,
            max_guests: row.try_get("max_guests")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Editable listing fields, validated by the handler
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceFields {
    pub title: String,
    pub address: String,
    pub photos: Vec<String>,
    pub description: String,
    pub perks: Vec<String>,
    pub extra_info: String,
    pub check_in: String,
    pub check_out: String,
    pub max_guests: i32,
    pub price: i64,
}

impl Place {
    pub fn apply(&mut self, fields: PlaceFields, now: DateTime<Utc>) {
        self.title = fields.title;
        self.address = fields.address;
        self.photos = fields.photos;
        self.description = fields.description;
        self.perks = fields.perks;
        self.extra_info = fields.extra_info;
        self.check_in = fields.check_in;
        self.check_out = fields.check_out;
        self.max_guests = fields.max_guests;
        self.price = fields.price;
        self.updated_at = now;
    }
}

// ============================================================================
// BOOKINGS
// ============================================================================

/// Reservation of a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: BookingId,
    pub place: PlaceId,
    pub user: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub number_of_guests: i32,
    pub name: String,
    pub phone: String,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

impl FromRow for Booking {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            place: row.try_get("place_id")?,
            user: row.try_get("user_id")?,
            check_in: row.try_get("check_in")?,
            check_out: row.try_get("check_out")?,
            number_of_guests: row.try_get("number_of_guests")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub place: PlaceId,
    pub user: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub number_of_guests: i32,
    pub name: String,
    pub phone: String,
    pub price: i64,
}

/// Booking with its place embedded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithPlace {
    #[serde(rename = "_id")]
    pub id: BookingId,
    pub place: Place,
    pub user: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub number_of_guests: i32,
    pub name: String,
    pub phone: String,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn with_place(self, place: Place) -> BookingWithPlace {
        BookingWithPlace {
            id: self.id,
            place,
            user: self.user,
            check_in: self.check_in,
            check_out: self.check_out,
            number_of_guests: self.number_of_guests,
            name: self.name,
            phone: self.phone,
            price: self.price,
            created_at: self.created_at,
        }
    }
}

// ============================================================================
// GUIDES
// ============================================================================

/// Tour guide profile, owned by the account that registered it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    #[serde(rename = "_id")]
    pub id: GuideId,
    pub owner: UserId,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub languages: Vec<String>,
    pub places: Vec<String>,
    pub profile_photo: String,
    pub id_proof: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Guide {
    const RESOURCE: &'static str = "guide profile";

    fn owner(&self) -> UserId {
        self.owner
    }
}

impl FromRow for Guide {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            contact: row.try_get("contact")?,
            email: row.try_get("email")?,
            languages: row.try_get("languages")?,
            places: row.try_get("places")?,
            profile_photo: row.try_get("profile_photo")?,
            id_proof: row.try_get("id_proof")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Text fields of a guide profile
#[derive(Debug, Clone, PartialEq)]
pub struct GuideFields {
    pub name: String,
    pub contact: String,
    pub email: String,
    pub languages: Vec<String>,
    pub places: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewGuide {
    pub owner: UserId,
    pub fields: GuideFields,
    pub profile_photo: String,
    pub id_proof: String,
}

/// Replacement text fields plus any newly uploaded documents
#[derive(Debug, Clone)]
pub struct GuideUpdate {
    pub fields: GuideFields,
    pub profile_photo: Option<String>,
    pub id_proof: Option<String>,
}

impl Guide {
    pub fn apply(&mut self, update: GuideUpdate, now: DateTime<Utc>) {
        self.name = update.fields.name;
        self.contact = update.fields.contact;
        self.email = update.fields.email;
        self.languages = update.fields.languages;
        self.places = update.fields.places;
        if let Some(photo) = update.profile_photo {
            self.profile_photo = photo;
        }
        if let Some(proof) = update.id_proof {
            self.id_proof = proof;
        }
        self.updated_at = now;
    }
}

// ============================================================================
// GUIDE BOOKINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideBooking {
    #[serde(rename = "_id")]
    pub id: GuideBookingId,
    pub user: UserId,
    pub guide: GuideId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub name: String,
    pub phone: String,
    pub booking_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl FromRow for GuideBooking {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user: row.try_get("user_id")?,
            guide: row.try_get("guide_id")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            booking_date: row.try_get("booking_date")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewGuideBooking {
    pub user: UserId,
    pub guide: GuideId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub name: String,
    pub phone: String,
    pub booking_date: DateTime<Utc>,
}

/// Guide booking with the guide profile embedded (booker's view)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideBookingWithGuide {
    #[serde(rename = "_id")]
    pub id: GuideBookingId,
    pub user: UserId,
    pub guide: Guide,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub name: String,
    pub phone: String,
    pub booking_date: DateTime<Utc>,
}

/// Guide booking with the booker's public fields embedded (guide's view)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideBookingWithUser {
    #[serde(rename = "_id")]
    pub id: GuideBookingId,
    pub user: Option<PublicUser>,
    pub guide: GuideId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub name: String,
    pub phone: String,
    pub booking_date: DateTime<Utc>,
}

impl GuideBooking {
    pub fn with_guide(self, guide: Guide) -> GuideBookingWithGuide {
        GuideBookingWithGuide {
            id: self.id,
            user: self.user,
            guide,
            start_date: self.start_date,
            end_date: self.end_date,
            name: self.name,
            phone: self.phone,
            booking_date: self.booking_date,
        }
    }

    pub fn with_user(self, user: Option<PublicUser>) -> GuideBookingWithUser {
        GuideBookingWithUser {
            id: self.id,
            user,
            guide: self.guide,
            start_date: self.start_date,
            end_date: self.end_date,
            name: self.name,
            phone: self.phone,
            booking_date: self.booking_date,
        }
    }
}
