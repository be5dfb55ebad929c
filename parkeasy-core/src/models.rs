use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    #[default]
    Regular,
    Disabled,
    Electric,
    Compact,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

/// Booking lifecycle: pending -> confirmed -> active -> completed, with
/// cancellation reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    /// Claimed by an in-flight charge.
    Processing,
    Paid,
    Refunded,
    Failed,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl SlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Regular => "regular",
            SlotType::Disabled => "disabled",
            SlotType::Electric => "electric",
            SlotType::Compact => "compact",
        }
    }
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Occupied => "occupied",
            SlotStatus::Reserved => "reserved",
            SlotStatus::Maintenance => "maintenance",
        }
    }

    pub fn is_available(&self) -> bool {
        *self == SlotStatus::Available
    }
}

impl BookingStatus {
    /// Statuses that keep a slot reserved for the booking.
    pub const OPEN: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Active,
    ];

    /// Statuses that block deleting the booked slot.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Confirmed, BookingStatus::Active];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn holds_slot(&self) -> bool {
        Self::OPEN.contains(self)
    }

    fn rank(&self) -> u8 {
        match self {
            BookingStatus::Pending => 0,
            BookingStatus::Confirmed => 1,
            BookingStatus::Active => 2,
            BookingStatus::Completed | BookingStatus::Cancelled => 3,
        }
    }

    /// Forward-only transitions; terminal states never move again.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == BookingStatus::Cancelled {
            return true;
        }
        next.rank() > self.rank()
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(ParseEnumError { kind: "user role", value: other.to_string() }),
        }
    }
}

impl FromStr for SlotType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(SlotType::Regular),
            "disabled" => Ok(SlotType::Disabled),
            "electric" => Ok(SlotType::Electric),
            "compact" => Ok(SlotType::Compact),
            other => Err(ParseEnumError { kind: "slot type", value: other.to_string() }),
        }
    }
}

impl FromStr for SlotStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SlotStatus::Available),
            "occupied" => Ok(SlotStatus::Occupied),
            "reserved" => Ok(SlotStatus::Reserved),
            "maintenance" => Ok(SlotStatus::Maintenance),
            other => Err(ParseEnumError { kind: "slot status", value: other.to_string() }),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "active" => Ok(BookingStatus::Active),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(ParseEnumError { kind: "booking status", value: other.to_string() }),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(ParseEnumError { kind: "payment status", value: other.to_string() }),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A parking facility. `available_slots` is a cached counter, only ever
/// moved through `ParkingStore::adjust_lot_counters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingLot {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_slots: i32,
    pub available_slots: i32,
    pub price_per_hour: f64,
    pub operating_hours: String,
    pub amenities: Vec<String>,
    pub contact_number: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub rating: Option<f64>,
    pub total_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingSlot {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub slot_number: String,
    pub slot_type: SlotType,
    pub status: SlotStatus,
    pub floor_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub license_plate: String,
    pub make: String,
    pub model: String,
    pub color: Option<String>,
    pub vehicle_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lot_id: Uuid,
    pub slot_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub total_price: f64,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    /// Payload carried by the scannable code (`BOOKING:<id>:<user>`).
    pub confirmation_code: Option<String>,
    /// Rendered scannable code as a data URI; empty when rendering failed.
    pub qr_code: Option<String>,
    pub receipt: Option<BookingReceipt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Receipt snapshot
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiptSlotInfo {
    pub slot_number: String,
    pub floor_level: Option<i32>,
    pub slot_type: Option<SlotType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiptVehicleInfo {
    pub license_plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub vehicle_type: Option<String>,
}

/// Immutable confirmation snapshot. Copied into the booking, never a live view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingReceipt {
    pub booking_id: Uuid,
    pub confirmation_number: String,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: Option<String>,
    pub parking_lot_name: String,
    pub parking_lot_address: String,
    pub parking_lot_contact: Option<String>,
    pub slot: ReceiptSlotInfo,
    pub vehicle: ReceiptVehicleInfo,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub confirmation_code: Option<String>,
    pub qr_code: Option<String>,
}
