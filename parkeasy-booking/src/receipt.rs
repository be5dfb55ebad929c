use chrono::{DateTime, Utc};
use parkeasy_core::{
    Booking, BookingReceipt, ParkingLot, ParkingSlot, ReceiptSlotInfo, ReceiptVehicleInfo, User,
    Vehicle,
};
use uuid::Uuid;

const CONFIRMATION_PREFIX: &str = "PA-";

/// `PA-` followed by the last six characters of the booking id, upper-cased.
pub fn confirmation_number(booking_id: Uuid) -> String {
    let id = booking_id.to_string();
    let tail = &id[id.len() - 6..];
    format!("{}{}", CONFIRMATION_PREFIX, tail.to_uppercase())
}

/// Snapshot the booking together with the related records as they are now.
pub fn build_receipt(
    booking: &Booking,
    user: &User,
    lot: &ParkingLot,
    slot: &ParkingSlot,
    vehicle: &Vehicle,
) -> BookingReceipt {
    BookingReceipt {
        booking_id: booking.id,
        confirmation_number: confirmation_number(booking.id),
        user_name: user.full_name.clone(),
        user_email: user.email.clone(),
        user_phone: user.phone.clone(),
        parking_lot_name: lot.name.clone(),
        parking_lot_address: lot.address.clone(),
        parking_lot_contact: lot.contact_number.clone(),
        slot: ReceiptSlotInfo {
            slot_number: slot.slot_number.clone(),
            floor_level: Some(slot.floor_level),
            slot_type: Some(slot.slot_type),
        },
        vehicle: ReceiptVehicleInfo {
            license_plate: vehicle.license_plate.clone(),
            make: Some(vehicle.make.clone()),
            model: Some(vehicle.model.clone()),
            color: vehicle.color.clone(),
            vehicle_type: Some(vehicle.vehicle_type.clone()),
        },
        start_time: booking.start_time,
        end_time: booking.end_time,
        booking_status: booking.status,
        payment_status: booking.payment_status,
        total_price: booking.total_price,
        created_at: booking.created_at,
        confirmation_code: booking.confirmation_code.clone(),
        qr_code: booking.qr_code.clone(),
    }
}

/// Fresh snapshot when every related record still resolves, otherwise the
/// one stored on the booking (if any).
pub fn maybe_rebuild(
    booking: &Booking,
    user: Option<&User>,
    lot: Option<&ParkingLot>,
    slot: Option<&ParkingSlot>,
    vehicle: Option<&Vehicle>,
) -> Option<BookingReceipt> {
    match (user, lot, slot, vehicle) {
        (Some(user), Some(lot), Some(slot), Some(vehicle)) => {
            Some(build_receipt(booking, user, lot, slot, vehicle))
        }
        _ => booking.receipt.clone(),
    }
}

/// Human readable duration, e.g. `2 hours, 30 minutes`.
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let total_minutes = (end - start).num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{} hour{}", hours, if hours == 1 { "" } else { "s" }));
    }
    if minutes > 0 {
        parts.push(format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" }));
    }
    if parts.is_empty() {
        "Less than 1 hour".to_string()
    } else {
        parts.join(", ")
    }
}
