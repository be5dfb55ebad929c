//! The only places lot counters move. Any code path that changes slot or
//! review state goes through these instead of touching the fields directly.

use parkeasy_core::{CoreError, CoreResult, ParkingLot, ParkingStore};
use tracing::{debug, warn};
use uuid::Uuid;

/// Shift `available_slots` by `delta`, clamped to `[0, total_slots]`.
pub async fn adjust_availability(
    store: &dyn ParkingStore,
    lot_id: Uuid,
    delta: i32,
) -> CoreResult<Option<ParkingLot>> {
    adjust_inventory(store, lot_id, 0, delta).await
}

/// Shift both counters at once (slot creation and deletion).
pub async fn adjust_inventory(
    store: &dyn ParkingStore,
    lot_id: Uuid,
    total_delta: i32,
    available_delta: i32,
) -> CoreResult<Option<ParkingLot>> {
    if total_delta == 0 && available_delta == 0 {
        return Ok(store.get_lot(lot_id).await?);
    }
    let lot = store
        .adjust_lot_counters(lot_id, total_delta, available_delta)
        .await?;
    match &lot {
        Some(lot) => debug!(
            lot_id = %lot_id,
            total_slots = lot.total_slots,
            available_slots = lot.available_slots,
            "Lot counters adjusted"
        ),
        None => warn!(lot_id = %lot_id, "Counter adjustment for missing lot"),
    }
    Ok(lot)
}

/// Recompute the aggregate rating from every review of the lot.
/// Returns the stored `(rating, total_reviews)`.
pub async fn recompute_rating(
    store: &dyn ParkingStore,
    lot_id: Uuid,
) -> CoreResult<(Option<f64>, i32)> {
    let reviews = store.list_reviews(lot_id).await?;
    let count = i32::try_from(reviews.len())
        .map_err(|_| CoreError::InternalError("review count overflow".to_string()))?;

    let rating = if reviews.is_empty() {
        None
    } else {
        let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
        let mean = sum as f64 / reviews.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    };

    store.set_lot_rating(lot_id, rating, count).await?;
    debug!(lot_id = %lot_id, ?rating, total_reviews = count, "Lot rating recomputed");
    Ok((rating, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{lot, review};
    use parkeasy_core::MemoryStore;

    #[tokio::test]
    async fn test_rating_recomputed_from_all_reviews() {
        let store = MemoryStore::new();
        let lot = lot(10);
        store.insert_lot(&lot).await.unwrap();

        let mut ids = Vec::new();
        for rating in [5, 4, 3] {
            let r = review(lot.id, rating);
            ids.push(r.id);
            store.insert_review(&r).await.unwrap();
        }

        assert_eq!(recompute_rating(&store, lot.id).await.unwrap(), (Some(4.0), 3));
        let stored = store.get_lot(lot.id).await.unwrap().unwrap();
        assert_eq!(stored.rating, Some(4.0));
        assert_eq!(stored.total_reviews, 3);

        for id in ids {
            store.delete_review(id).await.unwrap();
        }
        assert_eq!(recompute_rating(&store, lot.id).await.unwrap(), (None, 0));
        let stored = store.get_lot(lot.id).await.unwrap().unwrap();
        assert_eq!(stored.rating, None);
        assert_eq!(stored.total_reviews, 0);
    }

    #[tokio::test]
    async fn test_rating_rounded_to_one_decimal() {
        let store = MemoryStore::new();
        let lot = lot(10);
        store.insert_lot(&lot).await.unwrap();
        for rating in [5, 4, 4] {
            store.insert_review(&review(lot.id, rating)).await.unwrap();
        }

        let (rating, _) = recompute_rating(&store, lot.id).await.unwrap();
        assert_eq!(rating, Some(4.3));
    }

    #[tokio::test]
    async fn test_availability_never_exceeds_total() {
        let store = MemoryStore::new();
        let lot = lot(2);
        store.insert_lot(&lot).await.unwrap();

        let updated = adjust_availability(&store, lot.id, 1).await.unwrap().unwrap();
        assert_eq!(updated.available_slots, 2);

        let updated = adjust_availability(&store, lot.id, -1).await.unwrap().unwrap();
        assert_eq!(updated.available_slots, 1);
    }
}
