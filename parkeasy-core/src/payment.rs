use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub booking_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub method: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Succeeded,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeReceipt {
    pub transaction_id: String, // e.g. txn_1a2b3c4d5e6f
    pub status: ChargeStatus,
    pub processed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Charge the booking amount through the provider
    async fn charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<ChargeReceipt, Box<dyn std::error::Error + Send + Sync>>;

    /// Return a settled charge in full
    async fn refund(
        &self,
        transaction_id: &str,
        amount: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
