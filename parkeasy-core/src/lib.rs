pub mod models;
pub mod repository;
pub mod memory;
pub mod identity;
pub mod payment;
pub mod notify;
pub mod render;
#[cfg(any(test, feature = "test-util"))]
pub mod faulty;

pub use identity::Principal;
pub use memory::MemoryStore;
#[cfg(any(test, feature = "test-util"))]
pub use faulty::FaultyStore;
pub use models::{
    Booking, BookingReceipt, BookingStatus, ParkingLot, ParkingSlot, PaymentStatus,
    ReceiptSlotInfo, ReceiptVehicleInfo, Review, SlotStatus, SlotType, User, UserRole, Vehicle,
};
pub use repository::{BookingFilter, ParkingStore, StoreResult};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Store failures are never expected by callers, so they surface as internal errors.
impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::InternalError(err.to_string())
    }
}
