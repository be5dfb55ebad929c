use chrono::{Duration, Utc};
use parkeasy_core::{
    Booking, BookingStatus, ParkingLot, ParkingSlot, PaymentStatus, Review, SlotStatus, SlotType,
    User, UserRole, Vehicle,
};
use uuid::Uuid;

pub fn lot(slots: i32) -> ParkingLot {
    let now = Utc::now();
    ParkingLot {
        id: Uuid::new_v4(),
        name: "Connaught Place Parking".to_string(),
        address: "Block A, Connaught Place, New Delhi".to_string(),
        latitude: 28.6315,
        longitude: 77.2167,
        total_slots: slots,
        available_slots: slots,
        price_per_hour: 50.0,
        operating_hours: "24/7".to_string(),
        amenities: vec!["CCTV".to_string()],
        contact_number: Some("+91-11-5550100".to_string()),
        image_url: None,
        is_active: true,
        rating: None,
        total_reviews: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn slot(lot_id: Uuid, number: &str, status: SlotStatus) -> ParkingSlot {
    let now = Utc::now();
    ParkingSlot {
        id: Uuid::new_v4(),
        lot_id,
        slot_number: number.to_string(),
        slot_type: SlotType::Regular,
        status,
        floor_level: 1,
        created_at: now,
        updated_at: now,
    }
}

pub fn user(role: UserRole) -> User {
    let now = Utc::now();
    let id = Uuid::new_v4();
    User {
        id,
        email: format!("{}@parkeasy.test", id.simple()),
        full_name: "Asha Rao".to_string(),
        phone: None,
        role,
        created_at: now,
        updated_at: now,
    }
}

pub fn vehicle(user_id: Uuid, plate: &str) -> Vehicle {
    Vehicle {
        id: Uuid::new_v4(),
        user_id,
        license_plate: plate.to_string(),
        make: "Maruti".to_string(),
        model: "Swift".to_string(),
        color: Some("White".to_string()),
        vehicle_type: "car".to_string(),
        created_at: Utc::now(),
    }
}

pub fn booking(user_id: Uuid, lot_id: Uuid, slot_id: Uuid, status: BookingStatus) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        user_id,
        lot_id,
        slot_id,
        vehicle_id: Uuid::new_v4(),
        start_time: now,
        end_time: now + Duration::hours(2),
        status,
        total_price: 100.0,
        payment_status: PaymentStatus::Pending,
        payment_reference: None,
        confirmation_code: None,
        qr_code: None,
        receipt: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn review(lot_id: Uuid, rating: i32) -> Review {
    Review {
        id: Uuid::new_v4(),
        lot_id,
        user_id: Uuid::new_v4(),
        user_name: "Asha Rao".to_string(),
        rating,
        comment: None,
        created_at: Utc::now(),
    }
}
