//! PostgreSQL-backed [`Store`].

use anyhow::Context;
use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::database::models::{
    Booking, FromRow, Guide, GuideBooking, GuideUpdate, NewBooking, NewGuide, NewGuideBooking, NewUser, Place,
    PlaceFields, User,
};
use crate::database::store::{EMAIL_TAKEN, GUIDE_EMAIL_TAKEN, GUIDE_EXISTS, Store, StoreError, StoreResult};
use crate::types::{GuideBookingId, GuideId, PlaceId, UserId};

pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> StoreResult<Object> {
        Ok(self.pool.get().await.context("Failed to get DB connection")?)
    }
}

/// Unique violations become conflicts; everything else is a backend failure
fn db_error(e: tokio_postgres::Error, operation: &'static str) -> StoreError {
    if let Some(db) = e.as_db_error() {
        if *db.code() == SqlState::UNIQUE_VIOLATION {
            let message = match db.constraint() {
                Some("users_email_key") => EMAIL_TAKEN,
                Some("guides_email_key") => GUIDE_EMAIL_TAKEN,
                Some("guides_owner_key") => GUIDE_EXISTS,
                _ => "Resource already exists",
            };
            return StoreError::Conflict(message.to_string());
        }
    }
    StoreError::Backend(anyhow::Error::new(e).context(operation))
}

fn one<T: FromRow>(row: &tokio_postgres::Row, operation: &'static str) -> StoreResult<T> {
    T::from_row(row).map_err(|e| db_error(e, operation))
}

fn many<T: FromRow>(rows: &[tokio_postgres::Row], operation: &'static str) -> StoreResult<Vec<T>> {
    rows.iter().map(|r| one(r, operation)).collect()
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        let client = self.client().await?;
        client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| db_error(e, "Database health check failed"))?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        const OP: &str = "Failed to insert user";
        let client = self.client().await?;
        let row = client
            .query_one(
                "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING *",
                &[&Uuid::new_v4(), &user.name, &user.email, &user.password_hash],
            )
            .await
            .map_err(|e| db_error(e, OP))?;
        one(&row, OP)
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        const OP: &str = "Failed to query user by id";
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM users WHERE id = $1", &[&id])
            .await
            .map_err(|e| db_error(e, OP))?;
        row.map(|r| one(&r, OP)).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        const OP: &str = "Failed to query user by email";
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM users WHERE email = $1", &[&email])
            .await
            .map_err(|e| db_error(e, OP))?;
        row.map(|r| one(&r, OP)).transpose()
    }

    async fn create_place(&self, owner: UserId, f: PlaceFields) -> StoreResult<Place> {
        const OP: &str = "Failed to insert place";
        let client = self.client().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO places (
                    id, owner_id, title, address, photos, description, perks,
                    extra_info, check_in, check_out, max_guests, price
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING *
                "#,
                &[
                    &Uuid::new_v4(),
                    &owner,
                    &f.title,
                    &f.address,
                    &f.photos,
                    &f.description,
                    &f.perks,
                    &f.extra_info,
                    &f.check_in,
                    &f.check_out,
                    &f.max_guests,
                    &f.price,
                ],
            )
            .await
            .map_err(|e| db_error(e, OP))?;
        one(&row, OP)
    }

    async fn find_place(&self, id: PlaceId) -> StoreResult<Option<Place>> {
        const OP: &str = "Failed to query place";
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM places WHERE id = $1", &[&id])
            .await
            .map_err(|e| db_error(e, OP))?;
        row.map(|r| one(&r, OP)).transpose()
    }

    async fn list_places(&self) -> StoreResult<Vec<Place>> {
        const OP: &str = "Failed to list places";
        let client = self.client().await?;
        let rows = client
            .query("SELECT * FROM places ORDER BY created_at, id", &[])
            .await
            .map_err(|e| db_error(e, OP))?;
        many(&rows, OP)
    }

    async fn list_places_by_owner(&self, owner: UserId) -> StoreResult<Vec<Place>> {
        const OP: &str = "Failed to list places by owner";
        let client = self.client().await?;
        let rows = client
            .query("SELECT * FROM places WHERE owner_id = $1 ORDER BY created_at, id", &[&owner])
            .await
            .map_err(|e| db_error(e, OP))?;
        many(&rows, OP)
    }

    async fn update_place(&self, id: PlaceId, f: PlaceFields) -> StoreResult<Option<Place>> {
        const OP: &str = "Failed to update place";
        let client = self.client().await?;
        let row = client
            .query_opt(
                r#"
                UPDATE places SET
                    title = $2, address = $3, photos = $4, description = $5, perks = $6,
                    extra_info = $7, check_in = $8, check_out = $9, max_guests = $10,
                    price = $11, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
                &[
                    &id,
                    &f.title,
                    &f.address,
                    &f.photos,
                    &f.description,
                    &f.perks,
                    &f.extra_info,
                    &f.check_in,
                    &f.check_out,
                    &f.max_guests,
                    &f.price,
                ],
            )
            .await
            .map_err(|e| db_error(e, OP))?;
        row.map(|r| one(&r, OP)).transpose()
    }

    async fn create_booking(&self, b: NewBooking) -> StoreResult<Booking> {
        const OP: &str = "Failed to insert booking";
        let client = self.client().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO bookings (
                    id, place_id, user_id, check_in, check_out, number_of_guests, name, phone, price
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
                "#,
                &[
                    &Uuid::new_v4(),
                    &b.place,
                    &b.user,
                    &b.check_in,
                    &b.check_out,
                    &b.number_of_guests,
                    &b.name,
                    &b.phone,
                    &b.price,
                ],
            )
            .await
            .map_err(|e| db_error(e, OP))?;
        one(&row, OP)
    }

    async fn list_bookings_by_user(&self, user: UserId) -> StoreResult<Vec<Booking>> {
        const OP: &str = "Failed to list bookings";
        let client = self.client().await?;
        let rows = client
            .query("SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at, id", &[&user])
            .await
            .map_err(|e| db_error(e, OP))?;
        many(&rows, OP)
    }

    async fn create_guide(&self, g: NewGuide) -> StoreResult<Guide> {
        const OP: &str = "Failed to insert guide";
        let client = self.client().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO guides (
                    id, owner_id, name, contact, email, languages, places, profile_photo, id_proof
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
                "#,
                &[
                    &Uuid::new_v4(),
                    &g.owner,
                    &g.fields.name,
                    &g.fields.contact,
                    &g.fields.email,
                    &g.fields.languages,
                    &g.fields.places,
                    &g.profile_photo,
                    &g.id_proof,
                ],
            )
            .await
            .map_err(|e| db_error(e, OP))?;
        one(&row, OP)
    }

    async fn find_guide(&self, id: GuideId) -> StoreResult<Option<Guide>> {
        const OP: &str = "Failed to query guide";
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM guides WHERE id = $1", &[&id])
            .await
            .map_err(|e| db_error(e, OP))?;
        row.map(|r| one(&r, OP)).transpose()
    }

    async fn find_guide_by_email(&self, email: &str) -> StoreResult<Option<Guide>> {
        const OP: &str = "Failed to query guide by email";
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM guides WHERE email = $1", &[&email])
            .await
            .map_err(|e| db_error(e, OP))?;
        row.map(|r| one(&r, OP)).transpose()
    }

    async fn find_guide_by_owner(&self, owner: UserId) -> StoreResult<Option<Guide>> {
        const OP: &str = "Failed to query guide by owner";
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM guides WHERE owner_id = $1", &[&owner])
            .await
            .map_err(|e| db_error(e, OP))?;
        row.map(|r| one(&r, OP)).transpose()
    }

    async fn list_guides(&self) -> StoreResult<Vec<Guide>> {
        const OP: &str = "Failed to list guides";
        let client = self.client().await?;
        let rows = client
            .query("SELECT * FROM guides ORDER BY created_at, id", &[])
            .await
            .map_err(|e| db_error(e, OP))?;
        many(&rows, OP)
    }

    async fn update_guide(&self, id: GuideId, u: GuideUpdate) -> StoreResult<Option<Guide>> {
        const OP: &str = "Failed to update guide";
        let client = self.client().await?;
        let row = client
            .query_opt(
                r#"
                UPDATE guides SET
                    name = $2, contact = $3, email = $4, languages = $5, places = $6,
                    profile_photo = COALESCE($7, profile_photo),
                    id_proof = COALESCE($8, id_proof),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
                &[
                    &id,
                    &u.fields.name,
                    &u.fields.contact,
                    &u.fields.email,
                    &u.fields.languages,
                    &u.fields.places,
                    &u.profile_photo,
                    &u.id_proof,
                ],
            )
            .await
            .map_err(|e| db_error(e, OP))?;
        row.map(|r| one(&r, OP)).transpose()
    }

    async fn create_guide_booking(&self, b: NewGuideBooking) -> StoreResult<GuideBooking> {
        const OP: &str = "Failed to insert guide booking";
        let client = self.client().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO guide_bookings (
                    id, user_id, guide_id, start_date, end_date, name, phone, booking_date
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
                &[
                    &Uuid::new_v4(),
                    &b.user,
                    &b.guide,
                    &b.start_date,
                    &b.end_date,
                    &b.name,
                    &b.phone,
                    &b.booking_date,
                ],
            )
            .await
            .map_err(|e| db_error(e, OP))?;
        one(&row, OP)
    }

    async fn find_guide_booking(&self, id: GuideBookingId) -> StoreResult<Option<GuideBooking>> {
        const OP: &str = "Failed to query guide booking";
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM guide_bookings WHERE id = $1", &[&id])
            .await
            .map_err(|e| db_error(e, OP))?;
        row.map(|r| one(&r, OP)).transpose()
    }

    async fn list_guide_bookings_by_user(&self, user: UserId) -> StoreResult<Vec<GuideBooking>> {
        const OP: &str = "Failed to list guide bookings by user";
        let client = self.client().await?;
        let rows = client
            .query("SELECT * FROM guide_bookings WHERE user_id = $1 ORDER BY created_at, id", &[&user])
            .await
            .map_err(|e| db_error(e, OP))?;
        many(&rows, OP)
    }

    async fn list_guide_bookings_by_guide(&self, guide: GuideId) -> StoreResult<Vec<GuideBooking>> {
        const OP: &str = "Failed to list guide bookings by guide";
        let client = self.client().await?;
        let rows = client
            .query("SELECT * FROM guide_bookings WHERE guide_id = $1 ORDER BY created_at, id", &[&guide])
            .await
            .map_err(|e| db_error(e, OP))?;
        many(&rows, OP)
    }
}
