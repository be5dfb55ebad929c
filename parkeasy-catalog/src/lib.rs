pub mod pricing;
pub mod geo;
pub mod counters;
pub mod inventory;
pub mod lots;
pub mod reviews;
pub mod accounts;

pub use pricing::{PricingConfig, PricingEngine};
pub use geo::distance_km;
pub use counters::{adjust_availability, adjust_inventory, recompute_rating};
pub use inventory::{BulkSlotOutcome, BulkSlotRequest, NewSlot, SlotInventory, SlotPatch};
pub use lots::{LotPatch, LotSearch, LotService, NewLot};
pub use reviews::{NewReview, ReviewService};
pub use accounts::{
    AccountService, BookingSummary, FavoriteLot, NewUser, NewVehicle, ProfilePatch, UserDetails,
    UserPage, UserPatch, UserQuery, UserStats,
};

#[cfg(test)]
pub(crate) mod fixtures;
