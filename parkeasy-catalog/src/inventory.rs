use std::sync::Arc;

use chrono::Utc;
use parkeasy_core::{
    BookingFilter, BookingStatus, CoreError, CoreResult, ParkingSlot, ParkingStore, SlotStatus,
    SlotType,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::counters::{adjust_availability, adjust_inventory};

fn default_floor() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSlot {
    pub slot_number: String,
    #[serde(default)]
    pub slot_type: SlotType,
    #[serde(default)]
    pub status: SlotStatus,
    #[serde(default = "default_floor")]
    pub floor_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSlotRequest {
    pub start_number: u32,
    pub count: u32,
    #[serde(default)]
    pub slot_type: SlotType,
    #[serde(default = "default_floor")]
    pub floor_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSlotOutcome {
    pub created: Vec<ParkingSlot>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotPatch {
    pub slot_type: Option<SlotType>,
    pub status: Option<SlotStatus>,
    pub floor_level: Option<i32>,
}

/// Slot lifecycle and the availability rules tied to it.
///
/// Every status change goes through the store's conditional transition, so
/// the lot counter moves by at most one per successful transition and never
/// for a transition that lost a race.
pub struct SlotInventory {
    store: Arc<dyn ParkingStore>,
    max_bulk_slots: u32,
}

impl SlotInventory {
    pub fn new(store: Arc<dyn ParkingStore>, max_bulk_slots: u32) -> Self {
        Self { store, max_bulk_slots }
    }

    /// Claim an available slot for a booking.
    pub async fn reserve(&self, slot: &ParkingSlot) -> CoreResult<()> {
        let claimed = self
            .store
            .transition_slot_status(slot.id, &[SlotStatus::Available], SlotStatus::Reserved)
            .await?;
        if !claimed {
            return Err(CoreError::Conflict("Parking slot is not available".to_string()));
        }
        if let Err(e) = adjust_availability(self.store.as_ref(), slot.lot_id, -1).await {
            // the counter never moved, so only the slot goes back
            let undone = self
                .store
                .transition_slot_status(slot.id, &[SlotStatus::Reserved], SlotStatus::Available)
                .await;
            if let Err(undo) = undone {
                error!(
                    slot_id = %slot.id,
                    error = %undo,
                    "Failed to return slot after counter error"
                );
            }
            return Err(e);
        }
        info!(slot_id = %slot.id, lot_id = %slot.lot_id, "Slot reserved");
        Ok(())
    }

    /// Hand a held slot back to the pool. Returns false when the slot was
    /// not held (already released, under maintenance, or gone), in which
    /// case the counter is left alone.
    pub async fn release(&self, slot_id: Uuid) -> CoreResult<bool> {
        let Some(slot) = self.store.get_slot(slot_id).await? else {
            warn!(slot_id = %slot_id, "Release requested for missing slot");
            return Ok(false);
        };
        let released = self
            .store
            .transition_slot_status(
                slot_id,
                &[SlotStatus::Reserved, SlotStatus::Occupied],
                SlotStatus::Available,
            )
            .await?;
        if released {
            adjust_availability(self.store.as_ref(), slot.lot_id, 1).await?;
            info!(slot_id = %slot_id, lot_id = %slot.lot_id, "Slot released");
        }
        Ok(released)
    }

    pub async fn create_slot(&self, lot_id: Uuid, new_slot: NewSlot) -> CoreResult<ParkingSlot> {
        let slot_number = new_slot.slot_number.trim().to_string();
        if slot_number.is_empty() {
            return Err(CoreError::ValidationError("Slot number is required".to_string()));
        }
        if new_slot.floor_level < 0 {
            return Err(CoreError::ValidationError("Floor level cannot be negative".to_string()));
        }
        self.require_lot(lot_id).await?;

        if self.store.find_slot_by_number(lot_id, &slot_number).await?.is_some() {
            return Err(CoreError::Conflict(format!(
                "Slot number {} already exists in this lot",
                slot_number
            )));
        }

        let now = Utc::now();
        let slot = ParkingSlot {
            id: Uuid::new_v4(),
            lot_id,
            slot_number,
            slot_type: new_slot.slot_type,
            status: new_slot.status,
            floor_level: new_slot.floor_level,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_slot(&slot).await?;
        let available = i32::from(slot.status.is_available());
        adjust_inventory(self.store.as_ref(), lot_id, 1, available).await?;

        info!(slot_id = %slot.id, lot_id = %lot_id, slot_number = %slot.slot_number, "Slot created");
        Ok(slot)
    }

    /// Create `count` slots numbered `A{start:03}` upward. Numbers already
    /// present in the lot are skipped and reported.
    pub async fn create_bulk(
        &self,
        lot_id: Uuid,
        request: BulkSlotRequest,
    ) -> CoreResult<BulkSlotOutcome> {
        if request.count == 0 || request.count > self.max_bulk_slots {
            return Err(CoreError::ValidationError(format!(
                "Count must be between 1 and {}",
                self.max_bulk_slots
            )));
        }
        if request.start_number == 0 {
            return Err(CoreError::ValidationError("Start number must be at least 1".to_string()));
        }
        if request.floor_level < 0 {
            return Err(CoreError::ValidationError("Floor level cannot be negative".to_string()));
        }
        self.require_lot(lot_id).await?;

        let mut outcome = BulkSlotOutcome { created: Vec::new(), skipped: Vec::new() };
        for offset in 0..request.count {
            let slot_number = format!("A{:03}", request.start_number + offset);
            if self.store.find_slot_by_number(lot_id, &slot_number).await?.is_some() {
                outcome.skipped.push(slot_number);
                continue;
            }
            let now = Utc::now();
            let slot = ParkingSlot {
                id: Uuid::new_v4(),
                lot_id,
                slot_number,
                slot_type: request.slot_type,
                status: SlotStatus::Available,
                floor_level: request.floor_level,
                created_at: now,
                updated_at: now,
            };
            self.store.insert_slot(&slot).await?;
            outcome.created.push(slot);
        }

        let created = i32::try_from(outcome.created.len())
            .map_err(|_| CoreError::InternalError("slot count overflow".to_string()))?;
        adjust_inventory(self.store.as_ref(), lot_id, created, created).await?;

        info!(
            lot_id = %lot_id,
            created = outcome.created.len(),
            skipped = outcome.skipped.len(),
            "Bulk slot creation finished"
        );
        Ok(outcome)
    }

    pub async fn update_slot(&self, slot_id: Uuid, patch: SlotPatch) -> CoreResult<ParkingSlot> {
        let slot = self
            .store
            .get_slot(slot_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Parking slot not found".to_string()))?;

        if let Some(floor) = patch.floor_level {
            if floor < 0 {
                return Err(CoreError::ValidationError("Floor level cannot be negative".to_string()));
            }
        }

        let slot_type = patch.slot_type.unwrap_or(slot.slot_type);
        let floor_level = patch.floor_level.unwrap_or(slot.floor_level);
        if slot_type != slot.slot_type || floor_level != slot.floor_level {
            self.store.update_slot_details(slot_id, slot_type, floor_level).await?;
        }

        if let Some(next) = patch.status.filter(|next| *next != slot.status) {
            let moved = self
                .store
                .transition_slot_status(slot_id, &[slot.status], next)
                .await?;
            if !moved {
                return Err(CoreError::Conflict(
                    "Slot status changed concurrently, retry the update".to_string(),
                ));
            }
            let delta = match (slot.status.is_available(), next.is_available()) {
                (true, false) => -1,
                (false, true) => 1,
                _ => 0,
            };
            adjust_availability(self.store.as_ref(), slot.lot_id, delta).await?;
            info!(slot_id = %slot_id, from = %slot.status, to = %next, "Slot status updated");
        }

        self.store
            .get_slot(slot_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Parking slot not found".to_string()))
    }

    pub async fn delete_slot(&self, slot_id: Uuid) -> CoreResult<()> {
        let slot = self
            .store
            .get_slot(slot_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Parking slot not found".to_string()))?;

        let filter = BookingFilter { slot_id: Some(slot_id), ..Default::default() }
            .with_statuses(&BookingStatus::ACTIVE);
        if !self.store.list_bookings(&filter).await?.is_empty() {
            return Err(CoreError::Conflict("Cannot delete slot with active booking".to_string()));
        }

        if !self.store.delete_slot(slot_id).await? {
            return Err(CoreError::NotFound("Parking slot not found".to_string()));
        }
        let available = if slot.status.is_available() { -1 } else { 0 };
        adjust_inventory(self.store.as_ref(), slot.lot_id, -1, available).await?;

        info!(slot_id = %slot_id, lot_id = %slot.lot_id, "Slot deleted");
        Ok(())
    }

    async fn require_lot(&self, lot_id: Uuid) -> CoreResult<()> {
        match self.store.get_lot(lot_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound("Parking lot not found".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{booking, lot, slot};
    use parkeasy_core::{FaultyStore, MemoryStore};
    use std::sync::atomic::Ordering;

    async fn setup(slots: i32) -> (Arc<MemoryStore>, SlotInventory, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let lot = lot(slots);
        store.insert_lot(&lot).await.unwrap();
        let inventory = SlotInventory::new(store.clone(), 100);
        (store, inventory, lot.id)
    }

    async fn available(store: &MemoryStore, lot_id: Uuid) -> (i32, i32) {
        let lot = store.get_lot(lot_id).await.unwrap().unwrap();
        (lot.total_slots, lot.available_slots)
    }

    #[tokio::test]
    async fn test_reserve_returns_slot_when_counter_fails() {
        let (store, _, lot_id) = setup(1).await;
        let s = slot(lot_id, "A001", SlotStatus::Available);
        store.insert_slot(&s).await.unwrap();
        let faulty = FaultyStore::over(store.clone());
        faulty.counter_updates.store(true, Ordering::SeqCst);
        let inventory = SlotInventory::new(Arc::new(faulty), 100);

        assert!(matches!(inventory.reserve(&s).await.unwrap_err(), CoreError::InternalError(_)));
        assert_eq!(store.get_slot(s.id).await.unwrap().unwrap().status, SlotStatus::Available);
        assert_eq!(available(&store, lot_id).await, (1, 1));
    }

    #[tokio::test]
    async fn test_reserve_then_release() {
        let (store, inventory, lot_id) = setup(1).await;
        let s = slot(lot_id, "A001", SlotStatus::Available);
        store.insert_slot(&s).await.unwrap();

        inventory.reserve(&s).await.unwrap();
        assert_eq!(available(&store, lot_id).await, (1, 0));
        assert_eq!(store.get_slot(s.id).await.unwrap().unwrap().status, SlotStatus::Reserved);

        assert!(inventory.release(s.id).await.unwrap());
        assert_eq!(available(&store, lot_id).await, (1, 1));

        // second release is a no-op
        assert!(!inventory.release(s.id).await.unwrap());
        assert_eq!(available(&store, lot_id).await, (1, 1));
    }

    #[tokio::test]
    async fn test_reserve_unavailable_slot_conflicts() {
        let (store, inventory, lot_id) = setup(1).await;
        let s = slot(lot_id, "A001", SlotStatus::Maintenance);
        store.insert_slot(&s).await.unwrap();
        store.adjust_lot_counters(lot_id, 0, -1).await.unwrap();

        let err = inventory.reserve(&s).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(available(&store, lot_id).await, (1, 0));
    }

    #[tokio::test]
    async fn test_create_slot_updates_counters() {
        let (store, inventory, lot_id) = setup(0).await;

        inventory
            .create_slot(lot_id, NewSlot {
                slot_number: "B001".into(),
                slot_type: SlotType::Electric,
                status: SlotStatus::Available,
                floor_level: 2,
            })
            .await
            .unwrap();
        inventory
            .create_slot(lot_id, NewSlot {
                slot_number: "B002".into(),
                slot_type: SlotType::Regular,
                status: SlotStatus::Maintenance,
                floor_level: 2,
            })
            .await
            .unwrap();
        assert_eq!(available(&store, lot_id).await, (2, 1));

        let dup = inventory
            .create_slot(lot_id, NewSlot {
                slot_number: "B001".into(),
                slot_type: SlotType::Regular,
                status: SlotStatus::Available,
                floor_level: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(dup, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bulk_skips_existing_numbers() {
        let (store, inventory, lot_id) = setup(0).await;
        inventory
            .create_slot(lot_id, NewSlot {
                slot_number: "A002".into(),
                slot_type: SlotType::Regular,
                status: SlotStatus::Available,
                floor_level: 1,
            })
            .await
            .unwrap();

        let outcome = inventory
            .create_bulk(lot_id, BulkSlotRequest {
                start_number: 1,
                count: 3,
                slot_type: SlotType::Compact,
                floor_level: 1,
            })
            .await
            .unwrap();

        let numbers: Vec<_> = outcome.created.iter().map(|s| s.slot_number.as_str()).collect();
        assert_eq!(numbers, vec!["A001", "A003"]);
        assert_eq!(outcome.skipped, vec!["A002".to_string()]);
        assert_eq!(available(&store, lot_id).await, (3, 3));
    }

    #[tokio::test]
    async fn test_bulk_count_limit() {
        let (_store, inventory, lot_id) = setup(0).await;
        let err = inventory
            .create_bulk(lot_id, BulkSlotRequest {
                start_number: 1,
                count: 101,
                slot_type: SlotType::Regular,
                floor_level: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_status_update_moves_counter_by_one() {
        let (store, inventory, lot_id) = setup(1).await;
        let s = slot(lot_id, "A001", SlotStatus::Available);
        store.insert_slot(&s).await.unwrap();

        let patch = SlotPatch { status: Some(SlotStatus::Maintenance), ..Default::default() };
        inventory.update_slot(s.id, patch).await.unwrap();
        assert_eq!(available(&store, lot_id).await, (1, 0));

        // non-available to non-available leaves the counter alone
        let patch = SlotPatch { status: Some(SlotStatus::Occupied), ..Default::default() };
        inventory.update_slot(s.id, patch).await.unwrap();
        assert_eq!(available(&store, lot_id).await, (1, 0));

        let patch = SlotPatch {
            status: Some(SlotStatus::Available),
            floor_level: Some(3),
            ..Default::default()
        };
        let updated = inventory.update_slot(s.id, patch).await.unwrap();
        assert_eq!(updated.floor_level, 3);
        assert_eq!(available(&store, lot_id).await, (1, 1));
    }

    #[tokio::test]
    async fn test_delete_slot_with_active_booking_conflicts() {
        let (store, inventory, lot_id) = setup(1).await;
        let s = slot(lot_id, "A001", SlotStatus::Reserved);
        store.insert_slot(&s).await.unwrap();
        store
            .insert_booking(&booking(Uuid::new_v4(), lot_id, s.id, BookingStatus::Confirmed))
            .await
            .unwrap();

        let err = inventory.delete_slot(s.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(store.get_slot(s.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_available_slot_decrements_both_counters() {
        let (store, inventory, lot_id) = setup(2).await;
        let s = slot(lot_id, "A001", SlotStatus::Available);
        store.insert_slot(&s).await.unwrap();
        store
            .insert_booking(&booking(Uuid::new_v4(), lot_id, s.id, BookingStatus::Completed))
            .await
            .unwrap();

        inventory.delete_slot(s.id).await.unwrap();
        assert_eq!(available(&store, lot_id).await, (1, 1));
    }
}
