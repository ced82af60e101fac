//! In-process store
//!
//! Used by the test suite and when the server starts without `DATABASE_URL`.
//! Uniqueness rules mirror the PostgreSQL schema: one account per email, one
//! guide profile per email and per owning account.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

use crate::database::models::{
    Booking, Guide, GuideBooking, GuideUpdate, NewBooking, NewGuide, NewGuideBooking, NewUser, Place, PlaceFields, User,
};
use crate::database::store::{EMAIL_TAKEN, GUIDE_EMAIL_TAKEN, GUIDE_EXISTS, Store, StoreError, StoreResult};
use crate::types::{BookingId, GuideBookingId, GuideId, PlaceId, UserId};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    user_emails: DashMap<String, UserId>,
    places: DashMap<PlaceId, Place>,
    bookings: DashMap<BookingId, Booking>,
    guides: DashMap<GuideId, Guide>,
    guide_emails: DashMap<String, GuideId>,
    guide_owners: DashMap<UserId, GuideId>,
    guide_bookings: DashMap<GuideBookingId, GuideBooking>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Snapshot matching values, oldest first
fn collect<K, V, F>(map: &DashMap<K, V>, keep: F, created: fn(&V) -> (chrono::DateTime<Utc>, Uuid)) -> Vec<V>
where
    K: Eq + std::hash::Hash,
    V: Clone,
    F: Fn(&V) -> bool,
{
    let mut out: Vec<V> = map.iter().filter(|e| keep(e.value())).map(|e| e.value().clone()).collect();
    out.sort_by_key(|v| created(v));
    out
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        match self.user_emails.entry(new.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(EMAIL_TAKEN.to_string())),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    name: new.name,
                    email: new.email,
                    password_hash: new.password_hash,
                };
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let id = self.user_emails.get(email).map(|id| *id);
        Ok(id.and_then(|id| self.users.get(&id).map(|u| u.clone())))
    }

    async fn create_place(&self, owner: UserId, fields: PlaceFields) -> StoreResult<Place> {
        let now = Utc::now();
        let place = Place {
            id: Uuid::new_v4(),
            owner,
            title: fields.title,
            address: fields.address,
            photos: fields.photos,
            description: fields.description,
            perks: fields.perks,
            extra_info: fields.extra_info,
            check_in: fields.check_in,
            check_out: fields.check_out,
            max_guests: fields.max_guests,
            price: fields.price,
            created_at: now,
            updated_at: now,
        };
        self.places.insert(place.id, place.clone());
        Ok(place)
    }

    async fn find_place(&self, id: PlaceId) -> StoreResult<Option<Place>> {
        Ok(self.places.get(&id).map(|p| p.clone()))
    }

    async fn list_places(&self) -> StoreResult<Vec<Place>> {
        Ok(collect(&self.places, |_| true, |p| (p.created_at, p.id)))
    }

    async fn list_places_by_owner(&self, owner: UserId) -> StoreResult<Vec<Place>> {
        Ok(collect(&self.places, |p| p.owner == owner, |p| (p.created_at, p.id)))
    }

    async fn update_place(&self, id: PlaceId, fields: PlaceFields) -> StoreResult<Option<Place>> {
        Ok(self.places.get_mut(&id).map(|mut place| {
            place.apply(fields, Utc::now());
            place.clone()
        }))
    }

    async fn create_booking(&self, new: NewBooking) -> StoreResult<Booking> {
        let booking = Booking {
            id: Uuid::new_v4(),
            place: new.place,
            user: new.user,
            check_in: new.check_in,
            check_out: new.check_out,
            number_of_guests: new.number_of_guests,
            name: new.name,
            phone: new.phone,
            price: new.price,
            created_at: Utc::now(),
        };
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn list_bookings_by_user(&self, user: UserId) -> StoreResult<Vec<Booking>> {
        Ok(collect(&self.bookings, |b| b.user == user, |b| (b.created_at, b.id)))
    }

    async fn create_guide(&self, new: NewGuide) -> StoreResult<Guide> {
        let id = Uuid::new_v4();

        match self.guide_owners.entry(new.owner) {
            Entry::Occupied(_) => return Err(StoreError::Conflict(GUIDE_EXISTS.to_string())),
            Entry::Vacant(slot) => {
                match self.guide_emails.entry(new.fields.email.clone()) {
                    Entry::Occupied(_) => return Err(StoreError::Conflict(GUIDE_EMAIL_TAKEN.to_string())),
                    Entry::Vacant(email_slot) => {
                        email_slot.insert(id);
                    }
                }
                slot.insert(id);
            }
        }

        let now = Utc::now();
        let guide = Guide {
            id,
            owner: new.owner,
            name: new.fields.name,
            contact: new.fields.contact,
            email: new.fields.email,
            languages: new.fields.languages,
            places: new.fields.places,
            profile_photo: new.profile_photo,
            id_proof: new.id_proof,
            created_at: now,
            updated_at: now,
        };
        self.guides.insert(id, guide.clone());
        Ok(guide)
    }

    async fn find_guide(&self, id: GuideId) -> StoreResult<Option<Guide>> {
        Ok(self.guides.get(&id).map(|g| g.clone()))
    }

    async fn find_guide_by_email(&self, email: &str) -> StoreResult<Option<Guide>> {
        let id = self.guide_emails.get(email).map(|id| *id);
        Ok(id.and_then(|id| self.guides.get(&id).map(|g| g.clone())))
    }

    async fn find_guide_by_owner(&self, owner: UserId) -> StoreResult<Option<Guide>> {
        let id = self.guide_owners.get(&owner).map(|id| *id);
        Ok(id.and_then(|id| self.guides.get(&id).map(|g| g.clone())))
    }

    async fn list_guides(&self) -> StoreResult<Vec<Guide>> {
        Ok(collect(&self.guides, |_| true, |g| (g.created_at, g.id)))
    }

    async fn update_guide(&self, id: GuideId, update: GuideUpdate) -> StoreResult<Option<Guide>> {
        let Some(mut guide) = self.guides.get_mut(&id) else {
            return Ok(None);
        };

        let new_email = update.fields.email.clone();
        if new_email != guide.email {
            match self.guide_emails.entry(new_email) {
                Entry::Occupied(_) => return Err(StoreError::Conflict(GUIDE_EMAIL_TAKEN.to_string())),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.guide_emails.remove(&guide.email);
        }

        guide.apply(update, Utc::now());
        Ok(Some(guide.clone()))
    }

    async fn create_guide_booking(&self, new: NewGuideBooking) -> StoreResult<GuideBooking> {
        let booking = GuideBooking {
            id: Uuid::new_v4(),
            user: new.user,
            guide: new.guide,
            start_date: new.start_date,
            end_date: new.end_date,
            name: new.name,
            phone: new.phone,
            booking_date: new.booking_date,
            created_at: Utc::now(),
        };
        self.guide_bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_guide_booking(&self, id: GuideBookingId) -> StoreResult<Option<GuideBooking>> {
        Ok(self.guide_bookings.get(&id).map(|b| b.clone()))
    }

    async fn list_guide_bookings_by_user(&self, user: UserId) -> StoreResult<Vec<GuideBooking>> {
        Ok(collect(&self.guide_bookings, |b| b.user == user, |b| (b.created_at, b.id)))
    }

    async fn list_guide_bookings_by_guide(&self, guide: GuideId) -> StoreResult<Vec<GuideBooking>> {
        Ok(collect(&self.guide_bookings, |b| b.guide == guide, |b| (b.created_at, b.id)))
    }
}
