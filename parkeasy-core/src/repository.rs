use async_trait::async_trait;
use uuid::Uuid;

use chrono::{DateTime, Utc};

use crate::models::{
    Booking, BookingStatus, ParkingLot, ParkingSlot, PaymentStatus, Review, SlotStatus, SlotType,
    User, Vehicle,
};

pub type StoreResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Criteria for booking lookups. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<Uuid>,
    pub lot_id: Option<Uuid>,
    pub slot_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub statuses: Vec<BookingStatus>,
}

impl BookingFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self { user_id: Some(user_id), ..Default::default() }
    }

    pub fn with_statuses(mut self, statuses: &[BookingStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.map_or(true, |id| booking.user_id == id)
            && self.lot_id.map_or(true, |id| booking.lot_id == id)
            && self.slot_id.map_or(true, |id| booking.slot_id == id)
            && self.vehicle_id.map_or(true, |id| booking.vehicle_id == id)
            && (self.statuses.is_empty() || self.statuses.contains(&booking.status))
    }
}

/// Storage contract for every entity of the marketplace.
///
/// Counter and status mutations are exposed as dedicated operations so that
/// implementations can apply them atomically: `adjust_lot_counters` is an
/// increment clamped to `0 <= available <= total`, and the `transition_*`
/// methods only write when the current status is one of `from`, returning
/// whether the write happened.
#[async_trait]
pub trait ParkingStore: Send + Sync {
    // Lots
    async fn insert_lot(&self, lot: &ParkingLot) -> StoreResult<()>;
    async fn get_lot(&self, id: Uuid) -> StoreResult<Option<ParkingLot>>;
    async fn list_lots(&self, is_active: Option<bool>) -> StoreResult<Vec<ParkingLot>>;
    /// Writes descriptive fields only; counters and rating are left untouched.
    async fn update_lot(&self, lot: &ParkingLot) -> StoreResult<()>;
    async fn delete_lot(&self, id: Uuid) -> StoreResult<bool>;
    async fn adjust_lot_counters(
        &self,
        id: Uuid,
        total_delta: i32,
        available_delta: i32,
    ) -> StoreResult<Option<ParkingLot>>;
    async fn set_lot_rating(
        &self,
        id: Uuid,
        rating: Option<f64>,
        total_reviews: i32,
    ) -> StoreResult<()>;

    // Slots
    async fn insert_slot(&self, slot: &ParkingSlot) -> StoreResult<()>;
    async fn get_slot(&self, id: Uuid) -> StoreResult<Option<ParkingSlot>>;
    async fn list_slots(
        &self,
        lot_id: Uuid,
        status: Option<SlotStatus>,
    ) -> StoreResult<Vec<ParkingSlot>>;
    async fn find_slot_by_number(
        &self,
        lot_id: Uuid,
        slot_number: &str,
    ) -> StoreResult<Option<ParkingSlot>>;
    async fn update_slot_details(
        &self,
        id: Uuid,
        slot_type: SlotType,
        floor_level: i32,
    ) -> StoreResult<()>;
    async fn transition_slot_status(
        &self,
        id: Uuid,
        from: &[SlotStatus],
        to: SlotStatus,
    ) -> StoreResult<bool>;
    async fn delete_slot(&self, id: Uuid) -> StoreResult<bool>;
    async fn delete_slots_for_lot(&self, lot_id: Uuid) -> StoreResult<u64>;

    // Vehicles
    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()>;
    async fn get_vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>>;
    async fn find_vehicle_by_plate(&self, license_plate: &str) -> StoreResult<Option<Vehicle>>;
    async fn list_vehicles(&self, user_id: Uuid) -> StoreResult<Vec<Vehicle>>;
    async fn delete_vehicle(&self, id: Uuid) -> StoreResult<bool>;
    async fn delete_vehicles_for_user(&self, user_id: Uuid) -> StoreResult<u64>;

    // Users
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_user(&self, user: &User) -> StoreResult<()>;
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    // Bookings
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;
    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;
    /// Newest first.
    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>>;
    /// Sets `end_time` and `total_price` while the booking status is one of
    /// `status_in`; no other field is written.
    async fn set_booking_schedule(
        &self,
        id: Uuid,
        status_in: &[BookingStatus],
        end_time: DateTime<Utc>,
        total_price: f64,
    ) -> StoreResult<bool>;
    /// Moves `payment_status` from one of `from` to `to`, guarded on the
    /// booking status being one of `status_in` (empty: any status). A
    /// `reference` replaces the stored payment reference.
    async fn settle_payment(
        &self,
        id: Uuid,
        status_in: &[BookingStatus],
        from: &[PaymentStatus],
        to: PaymentStatus,
        reference: Option<&str>,
    ) -> StoreResult<bool>;
    async fn transition_booking_status(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<bool>;

    // Reviews
    async fn insert_review(&self, review: &Review) -> StoreResult<()>;
    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>>;
    async fn list_reviews(&self, lot_id: Uuid) -> StoreResult<Vec<Review>>;
    async fn find_review(&self, user_id: Uuid, lot_id: Uuid) -> StoreResult<Option<Review>>;
    async fn list_reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>>;
    async fn delete_review(&self, id: Uuid) -> StoreResult<bool>;
    async fn delete_reviews_for_user(&self, user_id: Uuid) -> StoreResult<u64>;
}
