use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parkeasy_catalog::SlotInventory;
use parkeasy_core::notify::{Notification, Notifier};
use parkeasy_core::render::{CodeEncoder, DocumentRenderer, RenderResult, RenderedDocument};
use parkeasy_core::{
    Booking, BookingReceipt, BookingStatus, MemoryStore, ParkingLot, ParkingSlot, ParkingStore,
    PaymentStatus, Principal, SlotStatus, SlotType, User, UserRole, Vehicle,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::artifacts::{confirmation_payload, ConfirmationArtifacts, QrCodeEncoder};
use crate::detached::DetachedTasks;
use crate::manager::{BookingManager, BookingRequest};
use crate::pdf::PdfReceiptRenderer;
use crate::receipt::build_receipt;

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(
        &self,
        _notification: &Notification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("mail relay refused connection".into())
    }
}

pub struct FailingEncoder;

impl CodeEncoder for FailingEncoder {
    fn encode(&self, _payload: &str) -> RenderResult<String> {
        Err("encoder offline".into())
    }
}

pub struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn render(&self, _receipt: &BookingReceipt) -> RenderResult<RenderedDocument> {
        Err("renderer offline".into())
    }
}

/// A lot with one available slot, a user and their vehicle.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub lot: ParkingLot,
    pub slot: ParkingSlot,
    pub user: User,
    pub vehicle: Vehicle,
    pub principal: Principal,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();

        let lot = ParkingLot {
            id: Uuid::new_v4(),
            name: "Connaught Place Parking".to_string(),
            address: "Block A, Connaught Place, New Delhi".to_string(),
            latitude: 28.6315,
            longitude: 77.2167,
            total_slots: 1,
            available_slots: 1,
            price_per_hour: 50.0,
            operating_hours: "24/7".to_string(),
            amenities: vec!["CCTV".to_string(), "EV Charging".to_string()],
            contact_number: Some("+91-11-5550100".to_string()),
            image_url: None,
            is_active: true,
            rating: None,
            total_reviews: 0,
            created_at: now,
            updated_at: now,
        };
        let slot = ParkingSlot {
            id: Uuid::new_v4(),
            lot_id: lot.id,
            slot_number: "A001".to_string(),
            slot_type: SlotType::Regular,
            status: SlotStatus::Available,
            floor_level: 1,
            created_at: now,
            updated_at: now,
        };
        let user = User {
            id: Uuid::new_v4(),
            email: "asha@parkeasy.test".to_string(),
            full_name: "Asha Rao".to_string(),
            phone: Some("+91-98765-43210".to_string()),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            user_id: user.id,
            license_plate: "DL01AB1234".to_string(),
            make: "Maruti".to_string(),
            model: "Swift".to_string(),
            color: Some("White".to_string()),
            vehicle_type: "car".to_string(),
            created_at: now,
        };

        store.insert_lot(&lot).await.unwrap();
        store.insert_slot(&slot).await.unwrap();
        store.insert_user(&user).await.unwrap();
        store.insert_vehicle(&vehicle).await.unwrap();

        let principal = Principal { user_id: user.id, email: user.email.clone(), role: user.role };
        Self { store, lot, slot, user, vehicle, principal }
    }

    pub fn admin() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "admin@parkeasy.test".to_string(),
            role: UserRole::Admin,
        }
    }

    pub fn stranger() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "stranger@parkeasy.test".to_string(),
            role: UserRole::User,
        }
    }

    pub fn request(&self, hours: i64) -> BookingRequest {
        let start = Utc::now() + Duration::hours(1);
        BookingRequest {
            lot_id: self.lot.id,
            slot_id: self.slot.id,
            vehicle_id: self.vehicle.id,
            start_time: start,
            end_time: start + Duration::hours(hours),
        }
    }

    /// Booking value (not stored) for the fixture's slot.
    pub fn booking_record(&self) -> Booking {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Booking {
            id,
            user_id: self.user.id,
            lot_id: self.lot.id,
            slot_id: self.slot.id,
            vehicle_id: self.vehicle.id,
            start_time: now,
            end_time: now + Duration::hours(2),
            status: BookingStatus::Pending,
            total_price: 100.0,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            confirmation_code: Some(confirmation_payload(id, self.user.id)),
            qr_code: Some("data:image/svg+xml;base64,PHN2Zy8+".to_string()),
            receipt: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn receipt(&self) -> BookingReceipt {
        build_receipt(&self.booking_record(), &self.user, &self.lot, &self.slot, &self.vehicle)
    }

    pub fn manager(
        &self,
        encoder: Arc<dyn CodeEncoder>,
        renderer: Arc<dyn DocumentRenderer>,
        notifier: Arc<dyn Notifier>,
    ) -> BookingManager {
        Self::manager_over(self.store.clone(), encoder, renderer, notifier)
    }

    pub fn manager_over(
        store: Arc<dyn ParkingStore>,
        encoder: Arc<dyn CodeEncoder>,
        renderer: Arc<dyn DocumentRenderer>,
        notifier: Arc<dyn Notifier>,
    ) -> BookingManager {
        BookingManager::new(
            store.clone(),
            Arc::new(SlotInventory::new(store, 100)),
            Arc::new(ConfirmationArtifacts::new(encoder, renderer)),
            notifier,
            DetachedTasks::new(StdDuration::from_secs(5)),
            "INR",
        )
    }

    pub fn default_manager(&self, notifier: Arc<dyn Notifier>) -> BookingManager {
        self.manager(
            Arc::new(QrCodeEncoder::default()),
            Arc::new(PdfReceiptRenderer::default()),
            notifier,
        )
    }

    pub async fn lot_counters(&self) -> (i32, i32) {
        let lot = self.store.get_lot(self.lot.id).await.unwrap().unwrap();
        (lot.total_slots, lot.available_slots)
    }

    pub async fn slot_status(&self) -> SlotStatus {
        self.store.get_slot(self.slot.id).await.unwrap().unwrap().status
    }
}
