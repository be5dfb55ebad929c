use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkeasy_core::{
    Booking, BookingFilter, BookingReceipt, BookingStatus, ParkingLot, ParkingSlot, ParkingStore,
    PaymentStatus, Review, SlotStatus, SlotType, StoreResult, User, Vehicle,
};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed store. Counter and status changes are single
/// statements, so concurrent requests never observe a half-applied update.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(sqlx::FromRow)]
struct LotRow {
    id: Uuid,
    name: String,
    address: String,
    latitude: f64,
    longitude: f64,
    total_slots: i32,
    available_slots: i32,
    price_per_hour: f64,
    operating_hours: String,
    amenities: Vec<String>,
    contact_number: Option<String>,
    image_url: Option<String>,
    is_active: bool,
    rating: Option<f64>,
    total_reviews: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LotRow> for ParkingLot {
    fn from(r: LotRow) -> Self {
        ParkingLot {
            id: r.id,
            name: r.name,
            address: r.address,
            latitude: r.latitude,
            longitude: r.longitude,
            total_slots: r.total_slots,
            available_slots: r.available_slots,
            price_per_hour: r.price_per_hour,
            operating_hours: r.operating_hours,
            amenities: r.amenities,
            contact_number: r.contact_number,
            image_url: r.image_url,
            is_active: r.is_active,
            rating: r.rating,
            total_reviews: r.total_reviews,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    id: Uuid,
    lot_id: Uuid,
    slot_number: String,
    slot_type: String,
    status: String,
    floor_level: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SlotRow> for ParkingSlot {
    type Error = Box<dyn std::error::Error + Send + Sync>;

    fn try_from(r: SlotRow) -> Result<Self, Self::Error> {
        Ok(ParkingSlot {
            id: r.id,
            lot_id: r.lot_id,
            slot_number: r.slot_number,
            slot_type: r.slot_type.parse()?,
            status: r.status.parse()?,
            floor_level: r.floor_level,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    user_id: Uuid,
    license_plate: String,
    make: String,
    model: String,
    color: Option<String>,
    vehicle_type: String,
    created_at: DateTime<Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(r: VehicleRow) -> Self {
        Vehicle {
            id: r.id,
            user_id: r.user_id,
            license_plate: r.license_plate,
            make: r.make,
            model: r.model,
            color: r.color,
            vehicle_type: r.vehicle_type,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    full_name: String,
    phone: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = Box<dyn std::error::Error + Send + Sync>;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: r.id,
            email: r.email,
            full_name: r.full_name,
            phone: r.phone,
            role: r.role.parse()?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    lot_id: Uuid,
    slot_id: Uuid,
    vehicle_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    total_price: f64,
    payment_status: String,
    payment_reference: Option<String>,
    confirmation_code: Option<String>,
    qr_code: Option<String>,
    receipt: Option<Json<BookingReceipt>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = Box<dyn std::error::Error + Send + Sync>;

    fn try_from(r: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: r.id,
            user_id: r.user_id,
            lot_id: r.lot_id,
            slot_id: r.slot_id,
            vehicle_id: r.vehicle_id,
            start_time: r.start_time,
            end_time: r.end_time,
            status: r.status.parse()?,
            total_price: r.total_price,
            payment_status: r.payment_status.parse()?,
            payment_reference: r.payment_reference,
            confirmation_code: r.confirmation_code,
            qr_code: r.qr_code,
            receipt: r.receipt.map(|Json(receipt)| receipt),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    lot_id: Uuid,
    user_id: Uuid,
    user_name: String,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Review {
            id: r.id,
            lot_id: r.lot_id,
            user_id: r.user_id,
            user_name: r.user_name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = Box<dyn std::error::Error + Send + Sync>>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn slot_statuses(from: &[SlotStatus]) -> Vec<String> {
    from.iter().map(|s| s.as_str().to_string()).collect()
}

fn booking_statuses(from: &[BookingStatus]) -> Vec<String> {
    from.iter().map(|s| s.as_str().to_string()).collect()
}

fn payment_statuses(from: &[PaymentStatus]) -> Vec<String> {
    from.iter().map(|s| s.as_str().to_string()).collect()
}

const LOT_COLUMNS: &str = "id, name, address, latitude, longitude, total_slots, available_slots, \
    price_per_hour, operating_hours, amenities, contact_number, image_url, is_active, rating, \
    total_reviews, created_at, updated_at";

const SLOT_COLUMNS: &str =
    "id, lot_id, slot_number, slot_type, status, floor_level, created_at, updated_at";

const VEHICLE_COLUMNS: &str =
    "id, user_id, license_plate, make, model, color, vehicle_type, created_at";

const USER_COLUMNS: &str = "id, email, full_name, phone, role, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, user_id, lot_id, slot_id, vehicle_id, start_time, end_time, \
    status, total_price, payment_status, payment_reference, confirmation_code, qr_code, receipt, \
    created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, lot_id, user_id, user_name, rating, comment, created_at";

#[async_trait]
impl ParkingStore for PgStore {
    // ========================================================================
    // Lots
    // ========================================================================

    async fn insert_lot(&self, lot: &ParkingLot) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO parking_lots (id, name, address, latitude, longitude, total_slots,
                available_slots, price_per_hour, operating_hours, amenities, contact_number,
                image_url, is_active, rating, total_reviews, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(lot.id)
        .bind(&lot.name)
        .bind(&lot.address)
        .bind(lot.latitude)
        .bind(lot.longitude)
        .bind(lot.total_slots)
        .bind(lot.available_slots)
        .bind(lot.price_per_hour)
        .bind(&lot.operating_hours)
        .bind(&lot.amenities)
        .bind(&lot.contact_number)
        .bind(&lot.image_url)
        .bind(lot.is_active)
        .bind(lot.rating)
        .bind(lot.total_reviews)
        .bind(lot.created_at)
        .bind(lot.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_lot(&self, id: Uuid) -> StoreResult<Option<ParkingLot>> {
        let row = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM parking_lots WHERE id = $1",
            LOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ParkingLot::from))
    }

    async fn list_lots(&self, is_active: Option<bool>) -> StoreResult<Vec<ParkingLot>> {
        let rows = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM parking_lots WHERE ($1::BOOLEAN IS NULL OR is_active = $1) ORDER BY name",
            LOT_COLUMNS
        ))
        .bind(is_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ParkingLot::from).collect())
    }

    async fn update_lot(&self, lot: &ParkingLot) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE parking_lots
            SET name = $2, address = $3, latitude = $4, longitude = $5, price_per_hour = $6,
                operating_hours = $7, amenities = $8, contact_number = $9, image_url = $10,
                is_active = $11, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(lot.id)
        .bind(&lot.name)
        .bind(&lot.address)
        .bind(lot.latitude)
        .bind(lot.longitude)
        .bind(lot.price_per_hour)
        .bind(&lot.operating_hours)
        .bind(&lot.amenities)
        .bind(&lot.contact_number)
        .bind(&lot.image_url)
        .bind(lot.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_lot(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM parking_lots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_lot_counters(
        &self,
        id: Uuid,
        total_delta: i32,
        available_delta: i32,
    ) -> StoreResult<Option<ParkingLot>> {
        // SET expressions see the pre-update row
        let row = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            UPDATE parking_lots
            SET total_slots = GREATEST(total_slots + $2, 0),
                available_slots = LEAST(GREATEST(available_slots + $3, 0), GREATEST(total_slots + $2, 0)),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LOT_COLUMNS
        ))
        .bind(id)
        .bind(total_delta)
        .bind(available_delta)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ParkingLot::from))
    }

    async fn set_lot_rating(
        &self,
        id: Uuid,
        rating: Option<f64>,
        total_reviews: i32,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE parking_lots SET rating = $2, total_reviews = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(rating)
        .bind(total_reviews)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ========================================================================
    // Slots
    // ========================================================================

    async fn insert_slot(&self, slot: &ParkingSlot) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO parking_slots (id, lot_id, slot_number, slot_type, status, floor_level,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(slot.id)
        .bind(slot.lot_id)
        .bind(&slot.slot_number)
        .bind(slot.slot_type.as_str())
        .bind(slot.status.as_str())
        .bind(slot.floor_level)
        .bind(slot.created_at)
        .bind(slot.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_slot(&self, id: Uuid) -> StoreResult<Option<ParkingSlot>> {
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            "SELECT {} FROM parking_slots WHERE id = $1",
            SLOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ParkingSlot::try_from).transpose()
    }

    async fn list_slots(
        &self,
        lot_id: Uuid,
        status: Option<SlotStatus>,
    ) -> StoreResult<Vec<ParkingSlot>> {
        let rows = sqlx::query_as::<_, SlotRow>(&format!(
            r#"
            SELECT {} FROM parking_slots
            WHERE lot_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY floor_level, slot_number
            "#,
            SLOT_COLUMNS
        ))
        .bind(lot_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn find_slot_by_number(
        &self,
        lot_id: Uuid,
        slot_number: &str,
    ) -> StoreResult<Option<ParkingSlot>> {
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            "SELECT {} FROM parking_slots WHERE lot_id = $1 AND slot_number = $2",
            SLOT_COLUMNS
        ))
        .bind(lot_id)
        .bind(slot_number)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ParkingSlot::try_from).transpose()
    }

    async fn update_slot_details(
        &self,
        id: Uuid,
        slot_type: SlotType,
        floor_level: i32,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE parking_slots SET slot_type = $2, floor_level = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(slot_type.as_str())
        .bind(floor_level)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn transition_slot_status(
        &self,
        id: Uuid,
        from: &[SlotStatus],
        to: SlotStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE parking_slots SET status = $3, updated_at = NOW() WHERE id = $1 AND status = ANY($2)",
        )
        .bind(id)
        .bind(slot_statuses(from))
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_slot(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM parking_slots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_slots_for_lot(&self, lot_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM parking_slots WHERE lot_id = $1")
            .bind(lot_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ========================================================================
    // Vehicles
    // ========================================================================

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, user_id, license_plate, make, model, color, vehicle_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(vehicle.id)
        .bind(vehicle.user_id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(&vehicle.color)
        .bind(&vehicle.vehicle_type)
        .bind(vehicle.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {} FROM vehicles WHERE id = $1",
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Vehicle::from))
    }

    async fn find_vehicle_by_plate(&self, license_plate: &str) -> StoreResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {} FROM vehicles WHERE license_plate = $1",
            VEHICLE_COLUMNS
        ))
        .bind(license_plate)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Vehicle::from))
    }

    async fn list_vehicles(&self, user_id: Uuid) -> StoreResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {} FROM vehicles WHERE user_id = $1 ORDER BY created_at DESC",
            VEHICLE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    async fn delete_vehicle(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_vehicles_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM vehicles WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ========================================================================
    // Users
    // ========================================================================

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, full_name, phone, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "UPDATE users SET email = $2, full_name = $3, phone = $4, role = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, lot_id, slot_id, vehicle_id, start_time, end_time,
                status, total_price, payment_status, payment_reference, confirmation_code, qr_code,
                receipt, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.lot_id)
        .bind(booking.slot_id)
        .bind(booking.vehicle_id)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.status.as_str())
        .bind(booking.total_price)
        .bind(booking.payment_status.as_str())
        .bind(&booking.payment_reference)
        .bind(&booking.confirmation_code)
        .bind(&booking.qr_code)
        .bind(booking.receipt.as_ref().map(Json))
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {} FROM bookings
            WHERE ($1::UUID IS NULL OR user_id = $1)
              AND ($2::UUID IS NULL OR lot_id = $2)
              AND ($3::UUID IS NULL OR slot_id = $3)
              AND ($4::UUID IS NULL OR vehicle_id = $4)
              AND (cardinality($5::TEXT[]) = 0 OR status = ANY($5))
            ORDER BY created_at DESC
            "#,
            BOOKING_COLUMNS
        ))
        .bind(filter.user_id)
        .bind(filter.lot_id)
        .bind(filter.slot_id)
        .bind(filter.vehicle_id)
        .bind(booking_statuses(&filter.statuses))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn set_booking_schedule(
        &self,
        id: Uuid,
        status_in: &[BookingStatus],
        end_time: DateTime<Utc>,
        total_price: f64,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET end_time = $3, total_price = $4, updated_at = NOW()
            WHERE id = $1 AND status = ANY($2)
            "#,
        )
        .bind(id)
        .bind(booking_statuses(status_in))
        .bind(end_time)
        .bind(total_price)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn settle_payment(
        &self,
        id: Uuid,
        status_in: &[BookingStatus],
        from: &[PaymentStatus],
        to: PaymentStatus,
        reference: Option<&str>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = $4,
                payment_reference = COALESCE($5, payment_reference),
                updated_at = NOW()
            WHERE id = $1
              AND (cardinality($2::TEXT[]) = 0 OR status = ANY($2))
              AND payment_status = ANY($3)
            "#,
        )
        .bind(id)
        .bind(booking_statuses(status_in))
        .bind(payment_statuses(from))
        .bind(to.as_str())
        .bind(reference)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn transition_booking_status(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET status = $3, updated_at = NOW() WHERE id = $1 AND status = ANY($2)",
        )
        .bind(id)
        .bind(booking_statuses(from))
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    // ========================================================================
    // Reviews
    // ========================================================================

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, lot_id, user_id, user_name, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id)
        .bind(review.lot_id)
        .bind(review.user_id)
        .bind(&review.user_name)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE id = $1",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Review::from))
    }

    async fn list_reviews(&self, lot_id: Uuid) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE lot_id = $1 ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(lot_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn find_review(&self, user_id: Uuid, lot_id: Uuid) -> StoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE user_id = $1 AND lot_id = $2",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .bind(lot_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Review::from))
    }

    async fn list_reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE user_id = $1",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_reviews_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM reviews WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
