pub mod receipt;
pub mod artifacts;
pub mod pdf;
pub mod email;
pub mod detached;
pub mod manager;
pub mod orchestrator;
pub mod stats;

pub use artifacts::{ConfirmationArtifacts, QrCodeEncoder};
pub use detached::DetachedTasks;
pub use manager::{BookingDetails, BookingManager, BookingPatch, BookingRequest};
pub use orchestrator::{PaymentOrchestrator, PaymentOutcome, SimulatedPaymentAdapter};
pub use pdf::PdfReceiptRenderer;
pub use receipt::{build_receipt, confirmation_number, format_duration, maybe_rebuild};
pub use stats::{realtime_stats, RealtimeStats};

#[cfg(test)]
pub(crate) mod testing;
