use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::memory::MemoryStore;
use crate::models::{
    Booking, BookingStatus, ParkingLot, ParkingSlot, PaymentStatus, Review, SlotStatus, SlotType,
    User, Vehicle,
};
use crate::repository::{BookingFilter, ParkingStore, StoreResult};

/// `MemoryStore` wrapper whose vehicle reads and counter updates can be
/// switched to fail.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: Arc<MemoryStore>,
    pub vehicle_reads: AtomicBool,
    pub counter_updates: AtomicBool,
}

impl FaultyStore {
    pub fn over(inner: Arc<MemoryStore>) -> Self {
        Self { inner, ..Default::default() }
    }
}

#[async_trait]
impl ParkingStore for FaultyStore {
    async fn insert_lot(&self, lot: &ParkingLot) -> StoreResult<()> {
        self.inner.insert_lot(lot).await
    }

    async fn get_lot(&self, id: Uuid) -> StoreResult<Option<ParkingLot>> {
        self.inner.get_lot(id).await
    }

    async fn list_lots(&self, is_active: Option<bool>) -> StoreResult<Vec<ParkingLot>> {
        self.inner.list_lots(is_active).await
    }

    async fn update_lot(&self, lot: &ParkingLot) -> StoreResult<()> {
        self.inner.update_lot(lot).await
    }

    async fn delete_lot(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_lot(id).await
    }

    async fn adjust_lot_counters(
        &self,
        id: Uuid,
        total_delta: i32,
        available_delta: i32,
    ) -> StoreResult<Option<ParkingLot>> {
        if self.counter_updates.load(Ordering::SeqCst) {
            return Err("counter update failed".into());
        }
        self.inner.adjust_lot_counters(id, total_delta, available_delta).await
    }

    async fn set_lot_rating(
        &self,
        id: Uuid,
        rating: Option<f64>,
        total_reviews: i32,
    ) -> StoreResult<()> {
        self.inner.set_lot_rating(id, rating, total_reviews).await
    }

    async fn insert_slot(&self, slot: &ParkingSlot) -> StoreResult<()> {
        self.inner.insert_slot(slot).await
    }

    async fn get_slot(&self, id: Uuid) -> StoreResult<Option<ParkingSlot>> {
        self.inner.get_slot(id).await
    }

    async fn list_slots(
        &self,
        lot_id: Uuid,
        status: Option<SlotStatus>,
    ) -> StoreResult<Vec<ParkingSlot>> {
        self.inner.list_slots(lot_id, status).await
    }

    async fn find_slot_by_number(
        &self,
        lot_id: Uuid,
        slot_number: &str,
    ) -> StoreResult<Option<ParkingSlot>> {
        self.inner.find_slot_by_number(lot_id, slot_number).await
    }

    async fn update_slot_details(
        &self,
        id: Uuid,
        slot_type: SlotType,
        floor_level: i32,
    ) -> StoreResult<()> {
        self.inner.update_slot_details(id, slot_type, floor_level).await
    }

    async fn transition_slot_status(
        &self,
        id: Uuid,
        from: &[SlotStatus],
        to: SlotStatus,
    ) -> StoreResult<bool> {
        self.inner.transition_slot_status(id, from, to).await
    }

    async fn delete_slot(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_slot(id).await
    }

    async fn delete_slots_for_lot(&self, lot_id: Uuid) -> StoreResult<u64> {
        self.inner.delete_slots_for_lot(lot_id).await
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        self.inner.insert_vehicle(vehicle).await
    }

    async fn get_vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        if self.vehicle_reads.load(Ordering::SeqCst) {
            return Err("vehicle lookup failed".into());
        }
        self.inner.get_vehicle(id).await
    }

    async fn find_vehicle_by_plate(&self, license_plate: &str) -> StoreResult<Option<Vehicle>> {
        self.inner.find_vehicle_by_plate(license_plate).await
    }

    async fn list_vehicles(&self, user_id: Uuid) -> StoreResult<Vec<Vehicle>> {
        self.inner.list_vehicles(user_id).await
    }

    async fn delete_vehicle(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_vehicle(id).await
    }

    async fn delete_vehicles_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        self.inner.delete_vehicles_for_user(user_id).await
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.inner.insert_user(user).await
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.inner.list_users().await
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.inner.update_user(user).await
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_user(id).await
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        self.inner.insert_booking(booking).await
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        self.inner.get_booking(id).await
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        self.inner.list_bookings(filter).await
    }

    async fn set_booking_schedule(
        &self,
        id: Uuid,
        status_in: &[BookingStatus],
        end_time: DateTime<Utc>,
        total_price: f64,
    ) -> StoreResult<bool> {
        self.inner.set_booking_schedule(id, status_in, end_time, total_price).await
    }

    async fn settle_payment(
        &self,
        id: Uuid,
        status_in: &[BookingStatus],
        from: &[PaymentStatus],
        to: PaymentStatus,
        reference: Option<&str>,
    ) -> StoreResult<bool> {
        self.inner.settle_payment(id, status_in, from, to, reference).await
    }

    async fn transition_booking_status(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<bool> {
        self.inner.transition_booking_status(id, from, to).await
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        self.inner.insert_review(review).await
    }

    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        self.inner.get_review(id).await
    }

    async fn list_reviews(&self, lot_id: Uuid) -> StoreResult<Vec<Review>> {
        self.inner.list_reviews(lot_id).await
    }

    async fn find_review(&self, user_id: Uuid, lot_id: Uuid) -> StoreResult<Option<Review>> {
        self.inner.find_review(user_id, lot_id).await
    }

    async fn list_reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>> {
        self.inner.list_reviews_by_user(user_id).await
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_review(id).await
    }

    async fn delete_reviews_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        self.inner.delete_reviews_for_user(user_id).await
    }
}
