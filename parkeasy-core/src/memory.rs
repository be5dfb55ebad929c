use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Booking, BookingStatus, ParkingLot, ParkingSlot, PaymentStatus, Review, SlotStatus, SlotType,
    User, Vehicle,
};
use crate::repository::{BookingFilter, ParkingStore, StoreResult};

/// In-process store backed by `RwLock`-guarded maps.
///
/// Conditional operations take the write lock for the whole
/// read-compare-write, which gives them the same atomicity as the single
/// `UPDATE ... WHERE` statements of the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    lots: RwLock<HashMap<Uuid, ParkingLot>>,
    slots: RwLock<HashMap<Uuid, ParkingSlot>>,
    vehicles: RwLock<HashMap<Uuid, Vehicle>>,
    users: RwLock<HashMap<Uuid, User>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
    reviews: RwLock<HashMap<Uuid, Review>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn remove_where<T>(map: &mut HashMap<Uuid, T>, pred: impl Fn(&T) -> bool) -> u64 {
    let before = map.len();
    map.retain(|_, v| !pred(v));
    (before - map.len()) as u64
}

#[async_trait]
impl ParkingStore for MemoryStore {
    async fn insert_lot(&self, lot: &ParkingLot) -> StoreResult<()> {
        self.lots.write().await.insert(lot.id, lot.clone());
        Ok(())
    }

    async fn get_lot(&self, id: Uuid) -> StoreResult<Option<ParkingLot>> {
        Ok(self.lots.read().await.get(&id).cloned())
    }

    async fn list_lots(&self, is_active: Option<bool>) -> StoreResult<Vec<ParkingLot>> {
        let mut lots: Vec<ParkingLot> = self
            .lots
            .read()
            .await
            .values()
            .filter(|l| is_active.map_or(true, |flag| l.is_active == flag))
            .cloned()
            .collect();
        lots.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lots)
    }

    async fn update_lot(&self, lot: &ParkingLot) -> StoreResult<()> {
        let mut lots = self.lots.write().await;
        if let Some(existing) = lots.get_mut(&lot.id) {
            existing.name = lot.name.clone();
            existing.address = lot.address.clone();
            existing.latitude = lot.latitude;
            existing.longitude = lot.longitude;
            existing.price_per_hour = lot.price_per_hour;
            existing.operating_hours = lot.operating_hours.clone();
            existing.amenities = lot.amenities.clone();
            existing.contact_number = lot.contact_number.clone();
            existing.image_url = lot.image_url.clone();
            existing.is_active = lot.is_active;
            existing.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_lot(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.lots.write().await.remove(&id).is_some())
    }

    async fn adjust_lot_counters(
        &self,
        id: Uuid,
        total_delta: i32,
        available_delta: i32,
    ) -> StoreResult<Option<ParkingLot>> {
        let mut lots = self.lots.write().await;
        let Some(lot) = lots.get_mut(&id) else {
            return Ok(None);
        };
        lot.total_slots = (lot.total_slots + total_delta).max(0);
        lot.available_slots = (lot.available_slots + available_delta).clamp(0, lot.total_slots);
        lot.updated_at = Utc::now();
        Ok(Some(lot.clone()))
    }

    async fn set_lot_rating(
        &self,
        id: Uuid,
        rating: Option<f64>,
        total_reviews: i32,
    ) -> StoreResult<()> {
        if let Some(lot) = self.lots.write().await.get_mut(&id) {
            lot.rating = rating;
            lot.total_reviews = total_reviews;
            lot.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_slot(&self, slot: &ParkingSlot) -> StoreResult<()> {
        let mut slots = self.slots.write().await;
        let duplicate = slots
            .values()
            .any(|s| s.lot_id == slot.lot_id && s.slot_number == slot.slot_number);
        if duplicate {
            return Err(format!("slot number {} already exists", slot.slot_number).into());
        }
        slots.insert(slot.id, slot.clone());
        Ok(())
    }

    async fn get_slot(&self, id: Uuid) -> StoreResult<Option<ParkingSlot>> {
        Ok(self.slots.read().await.get(&id).cloned())
    }

    async fn list_slots(
        &self,
        lot_id: Uuid,
        status: Option<SlotStatus>,
    ) -> StoreResult<Vec<ParkingSlot>> {
        let mut slots: Vec<ParkingSlot> = self
            .slots
            .read()
            .await
            .values()
            .filter(|s| s.lot_id == lot_id && status.map_or(true, |st| s.status == st))
            .cloned()
            .collect();
        slots.sort_by(|a, b| {
            a.floor_level
                .cmp(&b.floor_level)
                .then_with(|| a.slot_number.cmp(&b.slot_number))
        });
        Ok(slots)
    }

    async fn find_slot_by_number(
        &self,
        lot_id: Uuid,
        slot_number: &str,
    ) -> StoreResult<Option<ParkingSlot>> {
        Ok(self
            .slots
            .read()
            .await
            .values()
            .find(|s| s.lot_id == lot_id && s.slot_number == slot_number)
            .cloned())
    }

    async fn update_slot_details(
        &self,
        id: Uuid,
        slot_type: SlotType,
        floor_level: i32,
    ) -> StoreResult<()> {
        if let Some(slot) = self.slots.write().await.get_mut(&id) {
            slot.slot_type = slot_type;
            slot.floor_level = floor_level;
            slot.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn transition_slot_status(
        &self,
        id: Uuid,
        from: &[SlotStatus],
        to: SlotStatus,
    ) -> StoreResult<bool> {
        let mut slots = self.slots.write().await;
        match slots.get_mut(&id) {
            Some(slot) if from.contains(&slot.status) => {
                slot.status = to;
                slot.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_slot(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.slots.write().await.remove(&id).is_some())
    }

    async fn delete_slots_for_lot(&self, lot_id: Uuid) -> StoreResult<u64> {
        Ok(remove_where(&mut *self.slots.write().await, |s| s.lot_id == lot_id))
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        let mut vehicles = self.vehicles.write().await;
        if vehicles.values().any(|v| v.license_plate == vehicle.license_plate) {
            return Err(format!("license plate {} already registered", vehicle.license_plate).into());
        }
        vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn get_vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        Ok(self.vehicles.read().await.get(&id).cloned())
    }

    async fn find_vehicle_by_plate(&self, license_plate: &str) -> StoreResult<Option<Vehicle>> {
        Ok(self
            .vehicles
            .read()
            .await
            .values()
            .find(|v| v.license_plate == license_plate)
            .cloned())
    }

    async fn list_vehicles(&self, user_id: Uuid) -> StoreResult<Vec<Vehicle>> {
        let mut vehicles: Vec<Vehicle> = self
            .vehicles
            .read()
            .await
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    async fn delete_vehicle(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.vehicles.write().await.remove(&id).is_some())
    }

    async fn delete_vehicles_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        Ok(remove_where(&mut *self.vehicles.write().await, |v| v.user_id == user_id))
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(format!("email {} already registered", user.email).into());
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        if let Some(existing) = self.users.write().await.get_mut(&user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        self.bookings.write().await.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn set_booking_schedule(
        &self,
        id: Uuid,
        status_in: &[BookingStatus],
        end_time: DateTime<Utc>,
        total_price: f64,
    ) -> StoreResult<bool> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id) {
            Some(booking) if status_in.contains(&booking.status) => {
                booking.end_time = end_time;
                booking.total_price = total_price;
                booking.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn settle_payment(
        &self,
        id: Uuid,
        status_in: &[BookingStatus],
        from: &[PaymentStatus],
        to: PaymentStatus,
        reference: Option<&str>,
    ) -> StoreResult<bool> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id) {
            Some(booking)
                if (status_in.is_empty() || status_in.contains(&booking.status))
                    && from.contains(&booking.payment_status) =>
            {
                booking.payment_status = to;
                if let Some(reference) = reference {
                    booking.payment_reference = Some(reference.to_string());
                }
                booking.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn transition_booking_status(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<bool> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id) {
            Some(booking) if from.contains(&booking.status) => {
                booking.status = to;
                booking.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        let mut reviews = self.reviews.write().await;
        if reviews
            .values()
            .any(|r| r.user_id == review.user_id && r.lot_id == review.lot_id)
        {
            return Err("review already exists for this user and lot".into());
        }
        reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self.reviews.read().await.get(&id).cloned())
    }

    async fn list_reviews(&self, lot_id: Uuid) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .reviews
            .read()
            .await
            .values()
            .filter(|r| r.lot_id == lot_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn find_review(&self, user_id: Uuid, lot_id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self
            .reviews
            .read()
            .await
            .values()
            .find(|r| r.user_id == user_id && r.lot_id == lot_id)
            .cloned())
    }

    async fn list_reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>> {
        Ok(self
            .reviews
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.reviews.write().await.remove(&id).is_some())
    }

    async fn delete_reviews_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        Ok(remove_where(&mut *self.reviews.write().await, |r| r.user_id == user_id))
    }
}
