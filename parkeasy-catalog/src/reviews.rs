use std::sync::Arc;

use chrono::Utc;
use parkeasy_core::{
    BookingFilter, BookingStatus, CoreError, CoreResult, ParkingStore, Principal, Review,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::counters::recompute_rating;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub lot_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

pub struct ReviewService {
    store: Arc<dyn ParkingStore>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn ParkingStore>) -> Self {
        Self { store }
    }

    /// Reviews require a completed booking at the lot and are limited to
    /// one per user per lot.
    pub async fn create(&self, principal: &Principal, request: NewReview) -> CoreResult<Review> {
        if !(1..=5).contains(&request.rating) {
            return Err(CoreError::ValidationError("Rating must be between 1 and 5".to_string()));
        }
        if self.store.get_lot(request.lot_id).await?.is_none() {
            return Err(CoreError::NotFound("Parking lot not found".to_string()));
        }

        let completed = BookingFilter {
            user_id: Some(principal.user_id),
            lot_id: Some(request.lot_id),
            ..Default::default()
        }
        .with_statuses(&[BookingStatus::Completed]);
        if self.store.list_bookings(&completed).await?.is_empty() {
            return Err(CoreError::ValidationError(
                "You can only review parking lots where you have completed bookings".to_string(),
            ));
        }

        if self.store.find_review(principal.user_id, request.lot_id).await?.is_some() {
            return Err(CoreError::Conflict(
                "You have already reviewed this parking lot".to_string(),
            ));
        }

        let user_name = self
            .store
            .get_user(principal.user_id)
            .await?
            .map(|u| u.full_name)
            .unwrap_or_default();

        let review = Review {
            id: Uuid::new_v4(),
            lot_id: request.lot_id,
            user_id: principal.user_id,
            user_name,
            rating: request.rating,
            comment: request.comment,
            created_at: Utc::now(),
        };
        self.store.insert_review(&review).await?;
        recompute_rating(self.store.as_ref(), review.lot_id).await?;

        info!(review_id = %review.id, lot_id = %review.lot_id, "Review created");
        Ok(review)
    }

    pub async fn list_for_lot(&self, lot_id: Uuid) -> CoreResult<Vec<Review>> {
        Ok(self.store.list_reviews(lot_id).await?)
    }

    pub async fn delete(&self, principal: &Principal, review_id: Uuid) -> CoreResult<()> {
        let review = self
            .store
            .get_review(review_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Review not found".to_string()))?;

        if !principal.can_access(review.user_id) {
            return Err(CoreError::Forbidden(
                "Not authorized to delete this review".to_string(),
            ));
        }

        self.store.delete_review(review_id).await?;
        recompute_rating(self.store.as_ref(), review.lot_id).await?;

        info!(review_id = %review_id, lot_id = %review.lot_id, "Review deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{booking, lot, user};
    use parkeasy_core::{MemoryStore, UserRole};

    fn principal_for(user: &parkeasy_core::User) -> Principal {
        Principal { user_id: user.id, email: user.email.clone(), role: user.role }
    }

    #[tokio::test]
    async fn test_review_requires_completed_booking() {
        let store = Arc::new(MemoryStore::new());
        let service = ReviewService::new(store.clone());
        let lot = lot(3);
        store.insert_lot(&lot).await.unwrap();
        let u = user(UserRole::User);
        store.insert_user(&u).await.unwrap();
        let principal = principal_for(&u);

        let request = NewReview { lot_id: lot.id, rating: 5, comment: None };
        let err = service.create(&principal, request.clone()).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        store
            .insert_booking(&booking(u.id, lot.id, Uuid::new_v4(), BookingStatus::Completed))
            .await
            .unwrap();
        let review = service.create(&principal, request.clone()).await.unwrap();
        assert_eq!(review.user_name, u.full_name);

        let stored = store.get_lot(lot.id).await.unwrap().unwrap();
        assert_eq!((stored.rating, stored.total_reviews), (Some(5.0), 1));

        let dup = service.create(&principal, request).await.unwrap_err();
        assert!(matches!(dup, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_only_author_or_admin_deletes() {
        let store = Arc::new(MemoryStore::new());
        let service = ReviewService::new(store.clone());
        let lot = lot(3);
        store.insert_lot(&lot).await.unwrap();
        let author = user(UserRole::User);
        store.insert_user(&author).await.unwrap();
        store
            .insert_booking(&booking(author.id, lot.id, Uuid::new_v4(), BookingStatus::Completed))
            .await
            .unwrap();

        let review = service
            .create(&principal_for(&author), NewReview { lot_id: lot.id, rating: 2, comment: None })
            .await
            .unwrap();

        let stranger = principal_for(&user(UserRole::User));
        let err = service.delete(&stranger, review.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let admin = principal_for(&user(UserRole::Admin));
        service.delete(&admin, review.id).await.unwrap();

        let stored = store.get_lot(lot.id).await.unwrap().unwrap();
        assert_eq!((stored.rating, stored.total_reviews), (None, 0));
    }

    #[tokio::test]
    async fn test_rating_out_of_range() {
        let store = Arc::new(MemoryStore::new());
        let service = ReviewService::new(store);
        let principal = principal_for(&user(UserRole::User));
        let err = service
            .create(&principal, NewReview { lot_id: Uuid::new_v4(), rating: 6, comment: None })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }
}
