use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parkeasy_core::{
    BookingFilter, BookingStatus, CoreError, CoreResult, ParkingLot, ParkingSlot, ParkingStore,
    SlotStatus,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::geo::distance_km;
use crate::inventory::NewSlot;

fn default_operating_hours() -> String {
    "24/7".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLot {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Capacity when no slot list is given; ignored otherwise.
    #[serde(default)]
    pub total_slots: i32,
    pub price_per_hour: f64,
    #[serde(default = "default_operating_hours")]
    pub operating_hours: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub contact_number: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub slots: Vec<NewSlot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LotPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_per_hour: Option<f64>,
    pub operating_hours: Option<String>,
    pub amenities: Option<Vec<String>>,
    pub contact_number: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl LotPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.price_per_hour.is_none()
            && self.operating_hours.is_none()
            && self.amenities.is_none()
            && self.contact_number.is_none()
            && self.image_url.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LotSearch {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub max_distance: Option<f64>,
    pub is_active: Option<bool>,
}

fn validate_location(latitude: f64, longitude: f64) -> CoreResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(CoreError::ValidationError("Latitude must be between -90 and 90".to_string()));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(CoreError::ValidationError(
            "Longitude must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

fn validate_price(price: f64) -> CoreResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(CoreError::ValidationError("Price per hour cannot be negative".to_string()));
    }
    Ok(())
}

pub struct LotService {
    store: Arc<dyn ParkingStore>,
    default_radius_km: f64,
}

impl LotService {
    pub fn new(store: Arc<dyn ParkingStore>, default_radius_km: f64) -> Self {
        Self { store, default_radius_km }
    }

    pub async fn create(&self, new_lot: NewLot) -> CoreResult<ParkingLot> {
        if new_lot.name.trim().is_empty() {
            return Err(CoreError::ValidationError("Lot name is required".to_string()));
        }
        validate_location(new_lot.latitude, new_lot.longitude)?;
        validate_price(new_lot.price_per_hour)?;
        if new_lot.total_slots < 0 {
            return Err(CoreError::ValidationError("Total slots cannot be negative".to_string()));
        }

        {
            let mut seen = HashSet::new();
            for slot in &new_lot.slots {
                if !seen.insert(slot.slot_number.trim()) {
                    return Err(CoreError::Conflict(format!(
                        "Slot number {} appears more than once",
                        slot.slot_number
                    )));
                }
            }
        }

        let (total_slots, available_slots) = if new_lot.slots.is_empty() {
            (new_lot.total_slots, new_lot.total_slots)
        } else {
            let total = i32::try_from(new_lot.slots.len())
                .map_err(|_| CoreError::ValidationError("Too many slots".to_string()))?;
            let available = new_lot.slots.iter().filter(|s| s.status.is_available()).count();
            (total, available as i32)
        };

        let now = Utc::now();
        let lot = ParkingLot {
            id: Uuid::new_v4(),
            name: new_lot.name.trim().to_string(),
            address: new_lot.address,
            latitude: new_lot.latitude,
            longitude: new_lot.longitude,
            total_slots,
            available_slots,
            price_per_hour: new_lot.price_per_hour,
            operating_hours: new_lot.operating_hours,
            amenities: new_lot.amenities,
            contact_number: new_lot.contact_number,
            image_url: new_lot.image_url,
            is_active: true,
            rating: None,
            total_reviews: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_lot(&lot).await?;

        for new_slot in new_lot.slots {
            let slot = ParkingSlot {
                id: Uuid::new_v4(),
                lot_id: lot.id,
                slot_number: new_slot.slot_number.trim().to_string(),
                slot_type: new_slot.slot_type,
                status: new_slot.status,
                floor_level: new_slot.floor_level,
                created_at: now,
                updated_at: now,
            };
            self.store.insert_slot(&slot).await?;
        }

        info!(lot_id = %lot.id, name = %lot.name, total_slots, "Parking lot created");
        Ok(lot)
    }

    pub async fn get(&self, lot_id: Uuid) -> CoreResult<ParkingLot> {
        self.store
            .get_lot(lot_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Parking lot not found".to_string()))
    }

    pub async fn update(&self, lot_id: Uuid, patch: LotPatch) -> CoreResult<ParkingLot> {
        if patch.is_empty() {
            return Err(CoreError::ValidationError("No fields to update".to_string()));
        }
        let mut lot = self.get(lot_id).await?;

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(CoreError::ValidationError("Lot name is required".to_string()));
            }
            lot.name = name.trim().to_string();
        }
        if let Some(address) = patch.address {
            lot.address = address;
        }
        lot.latitude = patch.latitude.unwrap_or(lot.latitude);
        lot.longitude = patch.longitude.unwrap_or(lot.longitude);
        validate_location(lot.latitude, lot.longitude)?;
        if let Some(price) = patch.price_per_hour {
            validate_price(price)?;
            lot.price_per_hour = price;
        }
        if let Some(hours) = patch.operating_hours {
            lot.operating_hours = hours;
        }
        if let Some(amenities) = patch.amenities {
            lot.amenities = amenities;
        }
        if patch.contact_number.is_some() {
            lot.contact_number = patch.contact_number;
        }
        if patch.image_url.is_some() {
            lot.image_url = patch.image_url;
        }
        if let Some(active) = patch.is_active {
            lot.is_active = active;
        }

        self.store.update_lot(&lot).await?;
        info!(lot_id = %lot_id, "Parking lot updated");
        self.get(lot_id).await
    }

    /// Removes the lot and all of its slots. Refused while any booking
    /// still holds a slot in it.
    pub async fn delete(&self, lot_id: Uuid) -> CoreResult<()> {
        self.get(lot_id).await?;

        let filter = BookingFilter { lot_id: Some(lot_id), ..Default::default() }
            .with_statuses(&BookingStatus::OPEN);
        if !self.store.list_bookings(&filter).await?.is_empty() {
            return Err(CoreError::Conflict(
                "Cannot delete a parking lot with open bookings".to_string(),
            ));
        }

        let removed_slots = self.store.delete_slots_for_lot(lot_id).await?;
        if !self.store.delete_lot(lot_id).await? {
            return Err(CoreError::NotFound("Parking lot not found".to_string()));
        }
        info!(lot_id = %lot_id, removed_slots, "Parking lot deleted");
        Ok(())
    }

    /// Active-flag filter plus an optional radius around a point. Results
    /// are filtered, not ranked by distance.
    pub async fn search(&self, query: &LotSearch) -> CoreResult<Vec<ParkingLot>> {
        let lots = self.store.list_lots(Some(query.is_active.unwrap_or(true))).await?;

        let (Some(lat), Some(lon)) = (query.latitude, query.longitude) else {
            return Ok(lots);
        };
        validate_location(lat, lon)?;
        let radius = query.max_distance.unwrap_or(self.default_radius_km);

        Ok(lots
            .into_iter()
            .filter(|lot| distance_km(lat, lon, lot.latitude, lot.longitude) <= radius)
            .collect())
    }

    pub async fn list_slots(
        &self,
        lot_id: Uuid,
        status: Option<SlotStatus>,
    ) -> CoreResult<Vec<ParkingSlot>> {
        self.get(lot_id).await?;
        Ok(self.store.list_slots(lot_id, status).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{booking, lot, slot};
    use parkeasy_core::{MemoryStore, SlotType};

    fn new_lot(name: &str, latitude: f64, longitude: f64) -> NewLot {
        NewLot {
            name: name.to_string(),
            address: "somewhere".to_string(),
            latitude,
            longitude,
            total_slots: 0,
            price_per_hour: 40.0,
            operating_hours: default_operating_hours(),
            amenities: vec![],
            contact_number: None,
            image_url: None,
            slots: vec![],
        }
    }

    fn service() -> (Arc<MemoryStore>, LotService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), LotService::new(store, 10.0))
    }

    #[tokio::test]
    async fn test_create_with_slots_derives_counters() {
        let (store, service) = service();
        let mut request = new_lot("Saket Mall", 28.5245, 77.2066);
        request.total_slots = 50;
        request.slots = vec![
            NewSlot {
                slot_number: "A001".into(),
                slot_type: SlotType::Regular,
                status: SlotStatus::Available,
                floor_level: 1,
            },
            NewSlot {
                slot_number: "A002".into(),
                slot_type: SlotType::Disabled,
                status: SlotStatus::Maintenance,
                floor_level: 1,
            },
        ];

        let lot = service.create(request).await.unwrap();
        assert_eq!((lot.total_slots, lot.available_slots), (2, 1));
        assert_eq!(store.list_slots(lot.id, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_coordinates() {
        let (_store, service) = service();
        let err = service.create(new_lot("Nowhere", 91.0, 0.0)).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_search_filters_by_distance() {
        let (_store, service) = service();
        service.create(new_lot("Connaught Place", 28.6315, 77.2167)).await.unwrap();
        service.create(new_lot("Bandra", 19.0596, 72.8295)).await.unwrap();

        let near_delhi = service
            .search(&LotSearch {
                latitude: Some(28.6139),
                longitude: Some(77.2090),
                max_distance: Some(5.0),
                is_active: None,
            })
            .await
            .unwrap();
        assert_eq!(near_delhi.len(), 1);
        assert_eq!(near_delhi[0].name, "Connaught Place");

        let everything = service.search(&LotSearch::default()).await.unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_counters() {
        let (store, service) = service();
        let existing = lot(5);
        store.insert_lot(&existing).await.unwrap();
        store.adjust_lot_counters(existing.id, 0, -2).await.unwrap();

        let updated = service
            .update(existing.id, LotPatch { price_per_hour: Some(60.0), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.price_per_hour, 60.0);
        assert_eq!(updated.available_slots, 3);

        let err = service.update(existing.id, LotPatch::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_open_booking() {
        let (store, service) = service();
        let existing = lot(1);
        store.insert_lot(&existing).await.unwrap();
        let s = slot(existing.id, "A001", SlotStatus::Reserved);
        store.insert_slot(&s).await.unwrap();
        let b = booking(Uuid::new_v4(), existing.id, s.id, BookingStatus::Pending);
        store.insert_booking(&b).await.unwrap();

        let err = service.delete(existing.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        store
            .transition_booking_status(b.id, &[BookingStatus::Pending], BookingStatus::Cancelled)
            .await
            .unwrap();
        service.delete(existing.id).await.unwrap();
        assert!(store.get_lot(existing.id).await.unwrap().is_none());
        assert!(store.get_slot(s.id).await.unwrap().is_none());
    }
}
