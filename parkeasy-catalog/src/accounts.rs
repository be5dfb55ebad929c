use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use parkeasy_core::{
    Booking, BookingFilter, BookingStatus, CoreError, CoreResult, ParkingStore, PaymentStatus,
    Principal, User, UserRole, Vehicle,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::counters::recompute_rating;
use crate::pricing::round2;

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = 1000;

fn default_vehicle_type() -> String {
    "car".to_string()
}

fn default_role() -> UserRole {
    UserRole::User
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVehicle {
    pub license_plate: String,
    pub make: String,
    pub model: String,
    pub color: Option<String>,
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

/// Self-service profile edit; the role is admin-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub search: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total_bookings: usize,
    pub active_bookings: usize,
    pub total_spent: f64,
    pub total_vehicles: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteLot {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}

/// What a user sees about their own booking history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSummary {
    pub total_bookings: usize,
    pub active_bookings: usize,
    pub total_spent: f64,
    pub favorite_parking_lot: Option<FavoriteLot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub stats: UserStats,
    pub vehicles: Vec<Vehicle>,
}

/// User accounts and the vehicles they register.
pub struct AccountService {
    store: Arc<dyn ParkingStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn ParkingStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Vehicles
    // ========================================================================

    pub async fn register_vehicle(
        &self,
        principal: &Principal,
        request: NewVehicle,
    ) -> CoreResult<Vehicle> {
        let license_plate = request.license_plate.trim().to_uppercase();
        if license_plate.is_empty() {
            return Err(CoreError::ValidationError("License plate is required".to_string()));
        }
        if self.store.find_vehicle_by_plate(&license_plate).await?.is_some() {
            return Err(CoreError::Conflict(
                "Vehicle with this license plate already exists".to_string(),
            ));
        }

        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            user_id: principal.user_id,
            license_plate,
            make: request.make,
            model: request.model,
            color: request.color,
            vehicle_type: request.vehicle_type,
            created_at: Utc::now(),
        };
        self.store.insert_vehicle(&vehicle).await?;

        info!(vehicle_id = %vehicle.id, user_id = %principal.user_id, "Vehicle registered");
        Ok(vehicle)
    }

    pub async fn list_vehicles(&self, principal: &Principal) -> CoreResult<Vec<Vehicle>> {
        Ok(self.store.list_vehicles(principal.user_id).await?)
    }

    /// Vehicles of other users are reported as missing.
    pub async fn get_vehicle(&self, principal: &Principal, vehicle_id: Uuid) -> CoreResult<Vehicle> {
        self.store
            .get_vehicle(vehicle_id)
            .await?
            .filter(|v| v.user_id == principal.user_id)
            .ok_or_else(|| CoreError::NotFound("Vehicle not found".to_string()))
    }

    pub async fn delete_vehicle(&self, principal: &Principal, vehicle_id: Uuid) -> CoreResult<()> {
        self.get_vehicle(principal, vehicle_id).await?;

        let filter = BookingFilter { vehicle_id: Some(vehicle_id), ..Default::default() }
            .with_statuses(&BookingStatus::OPEN);
        if !self.store.list_bookings(&filter).await?.is_empty() {
            return Err(CoreError::Conflict(
                "Cannot delete a vehicle with open bookings".to_string(),
            ));
        }

        self.store.delete_vehicle(vehicle_id).await?;
        info!(vehicle_id = %vehicle_id, "Vehicle deleted");
        Ok(())
    }

    // ========================================================================
    // Own profile
    // ========================================================================

    pub async fn profile(&self, principal: &Principal) -> CoreResult<User> {
        self.get_user(principal.user_id).await
    }

    pub async fn update_profile(
        &self,
        principal: &Principal,
        patch: ProfilePatch,
    ) -> CoreResult<User> {
        if patch.full_name.is_none() && patch.phone.is_none() {
            return Err(CoreError::ValidationError("No fields to update".to_string()));
        }
        let patch = UserPatch { full_name: patch.full_name, phone: patch.phone, role: None };
        self.update_user(principal.user_id, patch).await
    }

    /// Counts over the caller's bookings. The favourite lot is the one
    /// booked most often, ties going to the most recently booked.
    pub async fn booking_summary(&self, principal: &Principal) -> CoreResult<BookingSummary> {
        let bookings = self
            .store
            .list_bookings(&BookingFilter::for_user(principal.user_id))
            .await?;

        let mut counts: HashMap<Uuid, usize> = HashMap::new();
        for booking in &bookings {
            *counts.entry(booking.lot_id).or_default() += 1;
        }
        let most = counts.values().copied().max().unwrap_or(0);
        // newest first, so the first hit wins ties
        let favorite_id = bookings
            .iter()
            .map(|b| b.lot_id)
            .find(|id| counts.get(id) == Some(&most));

        let favorite_parking_lot = match favorite_id {
            Some(lot_id) => self.store.get_lot(lot_id).await?.map(|lot| FavoriteLot {
                id: lot.id,
                name: lot.name,
                address: lot.address,
            }),
            None => None,
        };

        Ok(BookingSummary {
            total_bookings: bookings.len(),
            active_bookings: active_count(&bookings),
            total_spent: total_spent(&bookings),
            favorite_parking_lot,
        })
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn list_users(&self, query: &UserQuery) -> CoreResult<UserPage> {
        let skip = query.skip.unwrap_or(0);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let matching: Vec<User> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .filter(|u| query.role.map_or(true, |role| u.role == role))
            .filter(|u| match &needle {
                Some(needle) => {
                    u.email.to_lowercase().contains(needle)
                        || u.full_name.to_lowercase().contains(needle)
                        || u.phone.as_deref().is_some_and(|p| p.contains(needle.as_str()))
                }
                None => true,
            })
            .collect();

        let total = matching.len();
        let users = matching.into_iter().skip(skip).take(limit).collect();
        Ok(UserPage { users, total, skip, limit })
    }

    pub async fn user_details(&self, user_id: Uuid) -> CoreResult<UserDetails> {
        let user = self.get_user(user_id).await?;
        let bookings = self.store.list_bookings(&BookingFilter::for_user(user_id)).await?;
        let vehicles = self.store.list_vehicles(user_id).await?;

        let stats = UserStats {
            total_bookings: bookings.len(),
            active_bookings: active_count(&bookings),
            total_spent: total_spent(&bookings),
            total_vehicles: vehicles.len(),
        };

        Ok(UserDetails { user, stats, vehicles })
    }

    pub async fn get_user(&self, user_id: Uuid) -> CoreResult<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("User not found".to_string()))
    }

    pub async fn create_user(&self, request: NewUser) -> CoreResult<User> {
        let email = request.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(CoreError::ValidationError("A valid email is required".to_string()));
        }
        if request.full_name.trim().is_empty() {
            return Err(CoreError::ValidationError("Full name is required".to_string()));
        }
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(CoreError::Conflict("Email already registered".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            full_name: request.full_name.trim().to_string(),
            phone: request.phone,
            role: request.role,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;

        info!(user_id = %user.id, role = user.role.as_str(), "User created");
        Ok(user)
    }

    pub async fn update_user(&self, user_id: Uuid, patch: UserPatch) -> CoreResult<User> {
        let mut user = self.get_user(user_id).await?;
        if let Some(name) = patch.full_name {
            if name.trim().is_empty() {
                return Err(CoreError::ValidationError("Full name is required".to_string()));
            }
            user.full_name = name.trim().to_string();
        }
        if patch.phone.is_some() {
            user.phone = patch.phone;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        self.store.update_user(&user).await?;
        info!(user_id = %user_id, "User updated");
        Ok(user)
    }

    /// Removes the account with its vehicles and reviews. Bookings stay for
    /// the historical record; ratings of every reviewed lot are recomputed.
    pub async fn delete_user(&self, principal: &Principal, user_id: Uuid) -> CoreResult<()> {
        self.get_user(user_id).await?;
        if principal.user_id == user_id {
            return Err(CoreError::Forbidden("Cannot delete your own account".to_string()));
        }

        let reviewed_lots: BTreeSet<Uuid> = self
            .store
            .list_reviews_by_user(user_id)
            .await?
            .into_iter()
            .map(|r| r.lot_id)
            .collect();

        let vehicles = self.store.delete_vehicles_for_user(user_id).await?;
        let reviews = self.store.delete_reviews_for_user(user_id).await?;
        for lot_id in reviewed_lots {
            recompute_rating(self.store.as_ref(), lot_id).await?;
        }
        self.store.delete_user(user_id).await?;

        info!(user_id = %user_id, vehicles, reviews, "User deleted");
        Ok(())
    }
}

fn active_count(bookings: &[Booking]) -> usize {
    bookings.iter().filter(|b| BookingStatus::ACTIVE.contains(&b.status)).count()
}

fn total_spent(bookings: &[Booking]) -> f64 {
    round2(
        bookings
            .iter()
            .filter(|b| b.payment_status == PaymentStatus::Paid)
            .map(|b| b.total_price)
            .sum(),
    )
}
