use std::sync::Arc;

use chrono::{DateTime, Utc};
use parkeasy_catalog::{PricingEngine, SlotInventory};
use parkeasy_core::notify::Notifier;
use parkeasy_core::{
    Booking, BookingFilter, BookingStatus, CoreError, CoreResult, ParkingLot, ParkingStore,
    PaymentStatus, Principal, StoreResult, User, Vehicle,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::artifacts::{confirmation_payload, ConfirmationArtifacts};
use crate::detached::DetachedTasks;
use crate::email::confirmation_email;
use crate::receipt::{build_receipt, maybe_rebuild};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub lot_id: Uuid,
    pub slot_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingPatch {
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<BookingStatus>,
}

/// Booking with the related lot and vehicle resolved, as listed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub parking_lot: Option<ParkingLot>,
    pub vehicle: Option<Vehicle>,
}

/// Booking lifecycle: creation with slot reservation, extension,
/// status transitions with slot release, and owner-scoped reads.
pub struct BookingManager {
    store: Arc<dyn ParkingStore>,
    inventory: Arc<SlotInventory>,
    pricing: PricingEngine,
    artifacts: Arc<ConfirmationArtifacts>,
    notifier: Arc<dyn Notifier>,
    tasks: DetachedTasks,
    currency: String,
}

impl BookingManager {
    pub fn new(
        store: Arc<dyn ParkingStore>,
        inventory: Arc<SlotInventory>,
        artifacts: Arc<ConfirmationArtifacts>,
        notifier: Arc<dyn Notifier>,
        tasks: DetachedTasks,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            inventory,
            pricing: PricingEngine::default(),
            artifacts,
            notifier,
            tasks,
            currency: currency.into(),
        }
    }

    pub fn with_pricing(mut self, pricing: PricingEngine) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn tasks(&self) -> &DetachedTasks {
        &self.tasks
    }

    // ========================================================================
    // Create
    // ========================================================================

    /// Validate, reserve the slot, persist the booking, then hand the
    /// printable receipt and the confirmation e-mail to a detached task.
    pub async fn create(&self, principal: &Principal, request: BookingRequest) -> CoreResult<Booking> {
        if request.end_time <= request.start_time {
            return Err(CoreError::ValidationError(
                "End time must be after start time".to_string(),
            ));
        }

        let lot = self
            .store
            .get_lot(request.lot_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Parking lot not found".to_string()))?;

        let slot = self
            .store
            .get_slot(request.slot_id)
            .await?
            .filter(|s| s.lot_id == lot.id)
            .ok_or_else(|| CoreError::NotFound("Parking slot not found".to_string()))?;
        if !slot.status.is_available() {
            return Err(CoreError::Conflict("Parking slot is not available".to_string()));
        }

        let vehicle = self
            .store
            .get_vehicle(request.vehicle_id)
            .await?
            .filter(|v| v.user_id == principal.user_id)
            .ok_or_else(|| CoreError::NotFound("Vehicle not found".to_string()))?;

        let total_price =
            self.pricing
                .calculate_price(lot.price_per_hour, request.start_time, request.end_time);

        // Conditional claim; a concurrent booking of the same slot loses here.
        self.inventory.reserve(&slot).await?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let payload = confirmation_payload(id, principal.user_id);
        let qr_code = self.artifacts.scannable_code(id, &payload);

        let mut booking = Booking {
            id,
            user_id: principal.user_id,
            lot_id: lot.id,
            slot_id: slot.id,
            vehicle_id: vehicle.id,
            start_time: request.start_time,
            end_time: request.end_time,
            status: BookingStatus::Pending,
            total_price,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            confirmation_code: Some(payload),
            qr_code: Some(qr_code),
            receipt: None,
            created_at: now,
            updated_at: now,
        };

        let user = match self.store.get_user(principal.user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(booking_id = %id, error = %e, "User lookup for receipt failed");
                None
            }
        };
        match &user {
            Some(user) => booking.receipt = Some(build_receipt(&booking, user, &lot, &slot, &vehicle)),
            None => warn!(booking_id = %id, user_id = %principal.user_id, "No user record, booking has no receipt"),
        }

        if let Err(e) = self.store.insert_booking(&booking).await {
            error!(booking_id = %id, error = %e, "Failed to persist booking, releasing slot");
            if let Err(release_err) = self.inventory.release(slot.id).await {
                error!(slot_id = %slot.id, error = %release_err, "Slot release after failed insert also failed");
            }
            return Err(CoreError::InternalError(e.to_string()));
        }

        info!(
            booking_id = %id,
            user_id = %principal.user_id,
            lot_id = %lot.id,
            slot_id = %slot.id,
            total_price,
            "Booking created"
        );

        match user {
            Some(user) => self.dispatch_confirmation(&booking, user, lot),
            None => warn!(booking_id = %id, "Skipping confirmation e-mail, no recipient"),
        }

        Ok(booking)
    }

    fn dispatch_confirmation(&self, booking: &Booking, user: User, lot: ParkingLot) {
        let artifacts = self.artifacts.clone();
        let notifier = self.notifier.clone();
        let currency = self.currency.clone();
        let booking = booking.clone();

        self.tasks.spawn("booking_confirmation", booking.id, async move {
            let document = booking.receipt.as_ref().and_then(|r| artifacts.printable(r));
            let mail = confirmation_email(
                &booking,
                &user,
                &lot,
                booking.receipt.as_ref(),
                document,
                &currency,
            );
            notifier.send(&mail).await
        });
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Apply an end-time change and/or a status transition.
    ///
    /// Status moves are forward-only; repeating the current status is a
    /// no-op. Cancelling or completing a booking that still holds its slot
    /// releases the slot exactly once, guarded by the conditional status
    /// write. The stored receipt is left as it was.
    pub async fn update(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        patch: BookingPatch,
    ) -> CoreResult<Booking> {
        let booking = self.fetch(booking_id).await?;
        if !principal.can_access(booking.user_id) {
            return Err(CoreError::Forbidden(
                "Not authorized to update this booking".to_string(),
            ));
        }
        if patch.end_time.is_none() && patch.status.is_none() {
            return Err(CoreError::ValidationError("No fields to update".to_string()));
        }

        let transition = match patch.status {
            Some(next) if next != booking.status => {
                if !booking.status.can_transition_to(next) {
                    return Err(CoreError::Conflict(format!(
                        "Cannot change booking status from {} to {}",
                        booking.status, next
                    )));
                }
                Some(next)
            }
            _ => None,
        };

        if let Some(end_time) = patch.end_time {
            if booking.status.is_terminal() {
                return Err(CoreError::Conflict(format!(
                    "Cannot change the end time of a {} booking",
                    booking.status
                )));
            }
            if end_time <= booking.start_time {
                return Err(CoreError::ValidationError(
                    "End time must be after start time".to_string(),
                ));
            }
            let lot = self
                .store
                .get_lot(booking.lot_id)
                .await?
                .ok_or_else(|| CoreError::NotFound("Parking lot not found".to_string()))?;

            let total_price =
                self.pricing
                    .calculate_price(lot.price_per_hour, booking.start_time, end_time);
            let rescheduled = self
                .store
                .set_booking_schedule(booking_id, &BookingStatus::OPEN, end_time, total_price)
                .await?;
            if !rescheduled {
                return Err(CoreError::Conflict(
                    "Booking ended before the end time could change".to_string(),
                ));
            }
            info!(booking_id = %booking_id, total_price, "Booking end time changed");
        }

        if let Some(next) = transition {
            self.transition(&booking, next).await?;
        }

        self.fetch(booking_id).await
    }

    async fn transition(&self, booking: &Booking, next: BookingStatus) -> CoreResult<()> {
        let moved = self
            .store
            .transition_booking_status(booking.id, &[booking.status], next)
            .await?;

        if !moved {
            // Lost a race with another update; fine if it landed on the same status.
            let current = self.fetch(booking.id).await?;
            if current.status == next {
                return Ok(());
            }
            return Err(CoreError::Conflict(format!(
                "Booking status changed concurrently to {}",
                current.status
            )));
        }

        info!(booking_id = %booking.id, from = %booking.status, to = %next, "Booking status changed");

        if next.is_terminal() && booking.status.holds_slot() {
            let released = self.inventory.release(booking.slot_id).await?;
            if !released {
                warn!(
                    booking_id = %booking.id,
                    slot_id = %booking.slot_id,
                    "Slot was not held when the booking ended"
                );
            }
        }
        Ok(())
    }

    // ========================================================================
    // Read
    // ========================================================================

    pub async fn read(&self, principal: &Principal, booking_id: Uuid) -> CoreResult<Booking> {
        let booking = self.fetch(booking_id).await?;
        if !principal.can_access(booking.user_id) {
            return Err(CoreError::Forbidden(
                "Not authorized to view this booking".to_string(),
            ));
        }
        Ok(self.with_details(booking).await.booking)
    }

    pub async fn list_for_user(
        &self,
        principal: &Principal,
        status: Option<BookingStatus>,
    ) -> CoreResult<Vec<BookingDetails>> {
        let mut filter = BookingFilter::for_user(principal.user_id);
        if let Some(status) = status {
            filter = filter.with_statuses(&[status]);
        }
        self.list(&filter).await
    }

    /// Every booking in the system; callers gate this to admins.
    pub async fn list_all(&self, status: Option<BookingStatus>) -> CoreResult<Vec<BookingDetails>> {
        let mut filter = BookingFilter::default();
        if let Some(status) = status {
            filter = filter.with_statuses(&[status]);
        }
        self.list(&filter).await
    }

    async fn list(&self, filter: &BookingFilter) -> CoreResult<Vec<BookingDetails>> {
        let bookings = self.store.list_bookings(filter).await?;
        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            details.push(self.with_details(booking).await);
        }
        Ok(details)
    }

    /// Related records that fail to load are treated as missing, so the
    /// stored receipt is kept.
    async fn with_details(&self, mut booking: Booking) -> BookingDetails {
        let (lot, slot, vehicle, user) = tokio::join!(
            self.store.get_lot(booking.lot_id),
            self.store.get_slot(booking.slot_id),
            self.store.get_vehicle(booking.vehicle_id),
            self.store.get_user(booking.user_id),
        );
        let lot = related(booking.id, "lot", lot);
        let slot = related(booking.id, "slot", slot);
        let vehicle = related(booking.id, "vehicle", vehicle);
        let user = related(booking.id, "user", user);

        booking.receipt = maybe_rebuild(
            &booking,
            user.as_ref(),
            lot.as_ref(),
            slot.as_ref(),
            vehicle.as_ref(),
        );
        BookingDetails { booking, parking_lot: lot, vehicle }
    }

    async fn fetch(&self, booking_id: Uuid) -> CoreResult<Booking> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Booking not found".to_string()))
    }
}

fn related<T>(
    booking_id: Uuid,
    record: &'static str,
    loaded: StoreResult<Option<T>>,
) -> Option<T> {
    loaded.unwrap_or_else(|e| {
        warn!(booking_id = %booking_id, record, error = %e, "Failed to load related record");
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::QrCodeEncoder;
    use crate::pdf::PdfReceiptRenderer;
    use crate::testing::{
        FailingEncoder, FailingNotifier, FailingRenderer, Fixture, RecordingNotifier,
    };
    use parkeasy_catalog::PricingConfig;
    use parkeasy_core::FaultyStore;
    use std::sync::atomic::Ordering;
    use chrono::Duration;
    use parkeasy_core::SlotStatus;

    #[tokio::test]
    async fn test_create_reserves_slot_and_decrements_lot() {
        let fx = Fixture::new().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = fx.default_manager(notifier.clone());

        let booking = manager.create(&fx.principal, fx.request(2)).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.total_price, 100.0);
        assert_eq!(
            booking.confirmation_code.as_deref(),
            Some(format!("BOOKING:{}:{}", booking.id, fx.user.id).as_str())
        );
        assert!(booking.qr_code.as_deref().unwrap().starts_with("data:image/svg+xml;base64,"));
        assert_eq!(booking.receipt.as_ref().unwrap().slot.slot_number, "A001");

        assert_eq!(fx.slot_status().await, SlotStatus::Reserved);
        assert_eq!(fx.lot_counters().await, (1, 0));

        manager.tasks().drain().await;
        let sent = notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, fx.user.email);
        let attachment = sent[0].attachment.as_ref().unwrap();
        assert!(attachment.data.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_create_validation_order() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));

        let mut bad_times = fx.request(1);
        bad_times.end_time = bad_times.start_time;
        assert!(matches!(
            manager.create(&fx.principal, bad_times).await.unwrap_err(),
            CoreError::ValidationError(_)
        ));

        let mut no_lot = fx.request(1);
        no_lot.lot_id = Uuid::new_v4();
        assert!(matches!(
            manager.create(&fx.principal, no_lot).await.unwrap_err(),
            CoreError::NotFound(_)
        ));

        let mut foreign_vehicle = fx.request(1);
        foreign_vehicle.vehicle_id = Uuid::new_v4();
        assert!(matches!(
            manager.create(&fx.principal, foreign_vehicle).await.unwrap_err(),
            CoreError::NotFound(_)
        ));

        assert!(matches!(
            manager.create(&Fixture::stranger(), fx.request(1)).await.unwrap_err(),
            CoreError::NotFound(_)
        ));
        assert_eq!(fx.lot_counters().await, (1, 1));
    }

    #[tokio::test]
    async fn test_slot_from_other_lot_is_not_found() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let mut other_lot = fx.lot.clone();
        other_lot.id = Uuid::new_v4();
        fx.store.insert_lot(&other_lot).await.unwrap();

        let mut request = fx.request(1);
        request.lot_id = other_lot.id;
        assert!(matches!(
            manager.create(&fx.principal, request).await.unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_unavailable_slot_conflicts_without_touching_counters() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));

        manager.create(&fx.principal, fx.request(1)).await.unwrap();
        let err = manager.create(&fx.principal, fx.request(1)).await.unwrap_err();

        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(fx.lot_counters().await, (1, 0));
    }

    #[tokio::test]
    async fn test_concurrent_bookings_only_one_wins() {
        let fx = Fixture::new().await;
        let manager = Arc::new(fx.default_manager(Arc::new(RecordingNotifier::default())));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let principal = fx.principal.clone();
            let request = fx.request(1);
            handles.push(tokio::spawn(async move { manager.create(&principal, request).await }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert!(matches!(e, CoreError::Conflict(_))),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(fx.lot_counters().await, (1, 0));
    }

    #[tokio::test]
    async fn test_side_effect_failures_do_not_fail_booking() {
        let fx = Fixture::new().await;
        let manager = fx.manager(
            Arc::new(FailingEncoder),
            Arc::new(FailingRenderer),
            Arc::new(FailingNotifier),
        );

        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();
        manager.tasks().drain().await;

        assert_eq!(booking.qr_code.as_deref(), Some(""));
        assert!(booking.receipt.is_some());
        assert!(fx.store.get_booking(booking.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_user_record_yields_no_receipt() {
        let fx = Fixture::new().await;
        fx.store.delete_user(fx.user.id).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = fx.default_manager(notifier.clone());

        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();
        manager.tasks().drain().await;

        assert!(booking.receipt.is_none());
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_releases_once() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();

        let cancel = BookingPatch { status: Some(BookingStatus::Cancelled), ..Default::default() };
        let cancelled = manager.update(&fx.principal, booking.id, cancel.clone()).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(fx.slot_status().await, SlotStatus::Available);
        assert_eq!(fx.lot_counters().await, (1, 1));

        // repeating the cancellation is a no-op
        manager.update(&fx.principal, booking.id, cancel).await.unwrap();
        assert_eq!(fx.lot_counters().await, (1, 1));
    }

    #[tokio::test]
    async fn test_completion_releases_slot() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();
        let admin = Fixture::admin();

        for status in [BookingStatus::Confirmed, BookingStatus::Active, BookingStatus::Completed] {
            let patch = BookingPatch { status: Some(status), ..Default::default() };
            manager.update(&admin, booking.id, patch).await.unwrap();
        }

        assert_eq!(fx.slot_status().await, SlotStatus::Available);
        assert_eq!(fx.lot_counters().await, (1, 1));
    }

    #[tokio::test]
    async fn test_terminal_states_do_not_move() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();

        let cancel = BookingPatch { status: Some(BookingStatus::Cancelled), ..Default::default() };
        manager.update(&fx.principal, booking.id, cancel).await.unwrap();

        let revive = BookingPatch { status: Some(BookingStatus::Pending), ..Default::default() };
        assert!(matches!(
            manager.update(&fx.principal, booking.id, revive).await.unwrap_err(),
            CoreError::Conflict(_)
        ));

        let extend = BookingPatch {
            end_time: Some(booking.end_time + Duration::hours(1)),
            ..Default::default()
        };
        assert!(matches!(
            manager.update(&fx.principal, booking.id, extend).await.unwrap_err(),
            CoreError::Conflict(_)
        ));
        assert_eq!(fx.lot_counters().await, (1, 1));
    }

    #[tokio::test]
    async fn test_extension_reprices_from_original_start() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();
        assert_eq!(booking.total_price, 50.0);

        let patch = BookingPatch {
            end_time: Some(booking.start_time + Duration::minutes(150)),
            ..Default::default()
        };
        let updated = manager.update(&fx.principal, booking.id, patch).await.unwrap();

        assert_eq!(updated.total_price, 125.0);
        assert_eq!(updated.start_time, booking.start_time);
        assert_eq!(updated.status, BookingStatus::Pending);
        assert_eq!(fx.slot_status().await, SlotStatus::Reserved);
        assert_eq!(fx.lot_counters().await, (1, 0));

        let before_start = BookingPatch {
            end_time: Some(booking.start_time - Duration::minutes(1)),
            ..Default::default()
        };
        assert!(matches!(
            manager.update(&fx.principal, booking.id, before_start).await.unwrap_err(),
            CoreError::ValidationError(_)
        ));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();
        let stranger = Fixture::stranger();

        assert!(matches!(
            manager.read(&stranger, booking.id).await.unwrap_err(),
            CoreError::Forbidden(_)
        ));
        let cancel = BookingPatch { status: Some(BookingStatus::Cancelled), ..Default::default() };
        assert!(matches!(
            manager.update(&stranger, booking.id, cancel).await.unwrap_err(),
            CoreError::Forbidden(_)
        ));
        assert!(matches!(
            manager.read(&fx.principal, Uuid::new_v4()).await.unwrap_err(),
            CoreError::NotFound(_)
        ));

        manager.read(&Fixture::admin(), booking.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_rebuilds_receipt_or_falls_back() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();

        let mut renamed = fx.lot.clone();
        renamed.name = "CP Multi-Level".to_string();
        fx.store.update_lot(&renamed).await.unwrap();
        let read = manager.read(&fx.principal, booking.id).await.unwrap();
        assert_eq!(read.receipt.unwrap().parking_lot_name, "CP Multi-Level");

        fx.store.delete_vehicle(fx.vehicle.id).await.unwrap();
        let read = manager.read(&fx.principal, booking.id).await.unwrap();
        assert_eq!(read.receipt.unwrap().parking_lot_name, fx.lot.name);
    }

    #[tokio::test]
    async fn test_configured_billing_floor() {
        let fx = Fixture::new().await;
        let manager = fx
            .default_manager(Arc::new(RecordingNotifier::default()))
            .with_pricing(PricingEngine::new(PricingConfig {
                min_billable_hours: 2.0,
                ..Default::default()
            }));

        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();
        assert_eq!(booking.total_price, 100.0);
    }

    #[tokio::test]
    async fn test_counter_failure_leaves_slot_available() {
        let fx = Fixture::new().await;
        let faulty = FaultyStore::over(fx.store.clone());
        faulty.counter_updates.store(true, Ordering::SeqCst);
        let manager = Fixture::manager_over(
            Arc::new(faulty),
            Arc::new(QrCodeEncoder::default()),
            Arc::new(PdfReceiptRenderer::default()),
            Arc::new(RecordingNotifier::default()),
        );

        let err = manager.create(&fx.principal, fx.request(1)).await.unwrap_err();
        assert!(matches!(err, CoreError::InternalError(_)));
        assert_eq!(fx.slot_status().await, SlotStatus::Available);
        assert_eq!(fx.lot_counters().await, (1, 1));
        assert!(fx.store.list_bookings(&BookingFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_errors_fall_back_to_stored_receipt() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();
        let mut renamed = fx.lot.clone();
        renamed.name = "CP Multi-Level".to_string();
        fx.store.update_lot(&renamed).await.unwrap();

        let faulty = FaultyStore::over(fx.store.clone());
        faulty.vehicle_reads.store(true, Ordering::SeqCst);
        let outage = Fixture::manager_over(
            Arc::new(faulty),
            Arc::new(QrCodeEncoder::default()),
            Arc::new(PdfReceiptRenderer::default()),
            Arc::new(RecordingNotifier::default()),
        );

        let read = outage.read(&fx.principal, booking.id).await.unwrap();
        assert_eq!(read.receipt.unwrap().parking_lot_name, fx.lot.name);

        let listed = outage.list_for_user(&fx.principal, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].vehicle.is_none());
        assert_eq!(listed[0].parking_lot.as_ref().unwrap().name, "CP Multi-Level");
        assert_eq!(listed[0].booking.receipt.as_ref().unwrap().parking_lot_name, fx.lot.name);
    }

    #[tokio::test]
    async fn test_list_scoping_and_status_filter() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(1)).await.unwrap();

        let mine = manager.list_for_user(&fx.principal, None).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].parking_lot.as_ref().unwrap().id, fx.lot.id);
        assert_eq!(mine[0].vehicle.as_ref().unwrap().id, fx.vehicle.id);

        assert!(manager.list_for_user(&Fixture::stranger(), None).await.unwrap().is_empty());
        assert!(manager
            .list_for_user(&fx.principal, Some(BookingStatus::Cancelled))
            .await
            .unwrap()
            .is_empty());

        let all = manager.list_all(Some(BookingStatus::Pending)).await.unwrap();
        assert_eq!(all[0].booking.id, booking.id);
    }
}
