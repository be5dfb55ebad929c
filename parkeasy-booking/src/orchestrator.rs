use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parkeasy_core::payment::{ChargeReceipt, ChargeRequest, ChargeStatus, PaymentAdapter};
use parkeasy_core::{
    Booking, BookingStatus, CoreError, CoreResult, ParkingStore, PaymentStatus, Principal,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub booking: Booking,
    pub success: bool,
    pub transaction_id: Option<String>,
    pub message: String,
}

/// Provider stand-in: approves every charge except the `declined` method.
#[derive(Debug, Default, Clone)]
pub struct SimulatedPaymentAdapter;

#[async_trait]
impl PaymentAdapter for SimulatedPaymentAdapter {
    async fn charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<ChargeReceipt, Box<dyn std::error::Error + Send + Sync>> {
        let hex = Uuid::new_v4().simple().to_string();
        let status = if request.method.eq_ignore_ascii_case("declined") {
            ChargeStatus::Declined
        } else {
            ChargeStatus::Succeeded
        };
        Ok(ChargeReceipt {
            transaction_id: format!("txn_{}", &hex[..12]),
            status,
            processed_at: Utc::now(),
        })
    }

    async fn refund(
        &self,
        transaction_id: &str,
        amount: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(transaction_id, amount, "Simulated refund");
        Ok(())
    }
}

/// Payment states a new charge may start from.
const PAYABLE: [PaymentStatus; 2] = [PaymentStatus::Pending, PaymentStatus::Failed];

/// Drives a pending booking through the payment provider.
///
/// The booking is claimed (`payment_status = processing`) before the
/// provider is called, so concurrent attempts charge at most once. Only the
/// payment fields are written back; schedule changes made while the charge
/// is in flight survive.
pub struct PaymentOrchestrator {
    store: Arc<dyn ParkingStore>,
    adapter: Arc<dyn PaymentAdapter>,
    currency: String,
}

impl PaymentOrchestrator {
    pub fn new(
        store: Arc<dyn ParkingStore>,
        adapter: Arc<dyn PaymentAdapter>,
        currency: impl Into<String>,
    ) -> Self {
        Self { store, adapter, currency: currency.into() }
    }

    /// Charge the booking total. Success marks the booking paid and
    /// confirmed; a decline marks the payment failed and leaves the booking
    /// pending so the owner can retry. A booking cancelled while the charge
    /// was in flight is refunded.
    pub async fn pay(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        method: &str,
    ) -> CoreResult<PaymentOutcome> {
        let booking = self.fetch(booking_id).await?;

        if booking.user_id != principal.user_id {
            return Err(CoreError::Forbidden(
                "Not authorized to pay for this booking".to_string(),
            ));
        }
        if booking.status != BookingStatus::Pending || !PAYABLE.contains(&booking.payment_status) {
            return Err(CoreError::Conflict(format!(
                "Booking is {} with payment {}, nothing to pay",
                booking.status,
                booking.payment_status.as_str()
            )));
        }

        let claimed = self
            .store
            .settle_payment(
                booking_id,
                &[BookingStatus::Pending],
                &PAYABLE,
                PaymentStatus::Processing,
                None,
            )
            .await?;
        if !claimed {
            return Err(CoreError::Conflict(
                "Booking is no longer payable or a payment is already in progress".to_string(),
            ));
        }
        let previous = booking.payment_status;

        // charge the price as of the claim
        let booking = self.fetch(booking_id).await?;
        let request = ChargeRequest {
            booking_id,
            amount: booking.total_price,
            currency: self.currency.clone(),
            method: method.to_string(),
        };
        let charge = match self.adapter.charge(&request).await {
            Ok(charge) => charge,
            Err(e) => {
                error!(booking_id = %booking_id, error = %e, "Payment provider error");
                self.release_claim(booking_id, previous).await;
                return Err(CoreError::InternalError(format!("Payment provider error: {}", e)));
            }
        };

        let (success, message) = match charge.status {
            ChargeStatus::Succeeded => self.settle_success(&request, &charge.transaction_id).await?,
            ChargeStatus::Declined => {
                self.settle(
                    booking_id,
                    PaymentStatus::Processing,
                    PaymentStatus::Failed,
                    Some(charge.transaction_id.as_str()),
                )
                .await?;
                warn!(booking_id = %booking_id, transaction_id = %charge.transaction_id, "Payment declined");
                (false, "Payment was declined".to_string())
            }
        };

        Ok(PaymentOutcome {
            booking: self.fetch(booking_id).await?,
            success,
            transaction_id: Some(charge.transaction_id),
            message,
        })
    }

    async fn settle_success(
        &self,
        request: &ChargeRequest,
        transaction_id: &str,
    ) -> CoreResult<(bool, String)> {
        let booking_id = request.booking_id;
        self.settle(booking_id, PaymentStatus::Processing, PaymentStatus::Paid, Some(transaction_id))
            .await?;

        let confirmed = self
            .store
            .transition_booking_status(
                booking_id,
                &[BookingStatus::Pending],
                BookingStatus::Confirmed,
            )
            .await?;
        let current = self.fetch(booking_id).await?;
        if confirmed || !current.status.is_terminal() {
            info!(
                booking_id = %booking_id,
                transaction_id = %transaction_id,
                amount = request.amount,
                "Payment succeeded"
            );
            return Ok((true, "Payment processed successfully".to_string()));
        }

        warn!(
            booking_id = %booking_id,
            status = %current.status,
            "Booking ended while the charge was in flight, refunding"
        );
        match self.adapter.refund(transaction_id, request.amount).await {
            Ok(()) => {
                self.settle(booking_id, PaymentStatus::Paid, PaymentStatus::Refunded, None)
                    .await?;
                info!(booking_id = %booking_id, transaction_id = %transaction_id, "Payment refunded");
                Ok((
                    false,
                    format!("Booking was {} during payment, charge refunded", current.status),
                ))
            }
            Err(e) => {
                error!(
                    booking_id = %booking_id,
                    transaction_id = %transaction_id,
                    error = %e,
                    "Refund failed"
                );
                Err(CoreError::InternalError(format!("Refund failed: {}", e)))
            }
        }
    }

    async fn settle(
        &self,
        booking_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        reference: Option<&str>,
    ) -> CoreResult<()> {
        let moved = self.store.settle_payment(booking_id, &[], &[from], to, reference).await?;
        if !moved {
            error!(
                booking_id = %booking_id,
                from = from.as_str(),
                to = to.as_str(),
                "Payment state changed underneath the charge"
            );
            return Err(CoreError::InternalError(
                "Payment state changed during the charge".to_string(),
            ));
        }
        Ok(())
    }

    async fn release_claim(&self, booking_id: Uuid, previous: PaymentStatus) {
        let released = self
            .store
            .settle_payment(booking_id, &[], &[PaymentStatus::Processing], previous, None)
            .await;
        if let Err(e) = released {
            error!(booking_id = %booking_id, error = %e, "Failed to release payment claim");
        }
    }

    async fn fetch(&self, booking_id: Uuid) -> CoreResult<Booking> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Booking not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkeasy_core::SlotStatus;
    use crate::testing::{Fixture, RecordingNotifier};
    use crate::BookingPatch;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct BrokenAdapter;

    #[async_trait]
    impl PaymentAdapter for BrokenAdapter {
        async fn charge(
            &self,
            _request: &ChargeRequest,
        ) -> Result<ChargeReceipt, Box<dyn std::error::Error + Send + Sync>> {
            Err("gateway timeout".into())
        }

        async fn refund(
            &self,
            _transaction_id: &str,
            _amount: f64,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err("gateway timeout".into())
        }
    }

    /// Approves after a delay and counts provider calls.
    #[derive(Default)]
    struct SlowAdapter {
        charges: AtomicUsize,
        refunds: AtomicUsize,
    }

    #[async_trait]
    impl PaymentAdapter for SlowAdapter {
        async fn charge(
            &self,
            request: &ChargeRequest,
        ) -> Result<ChargeReceipt, Box<dyn std::error::Error + Send + Sync>> {
            self.charges.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            SimulatedPaymentAdapter.charge(request).await
        }

        async fn refund(
            &self,
            _transaction_id: &str,
            _amount: f64,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.refunds.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn pending_booking(fx: &Fixture) -> Booking {
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        manager.create(&fx.principal, fx.request(2)).await.unwrap()
    }

    fn orchestrator(fx: &Fixture, adapter: Arc<dyn PaymentAdapter>) -> PaymentOrchestrator {
        PaymentOrchestrator::new(fx.store.clone(), adapter, "INR")
    }

    #[tokio::test]
    async fn test_simulated_transaction_id_shape() {
        let request = ChargeRequest {
            booking_id: Uuid::new_v4(),
            amount: 10.0,
            currency: "INR".into(),
            method: "upi".into(),
        };
        let receipt = SimulatedPaymentAdapter.charge(&request).await.unwrap();
        assert_eq!(receipt.status, ChargeStatus::Succeeded);
        assert_eq!(receipt.transaction_id.len(), 16);
        assert!(receipt.transaction_id.starts_with("txn_"));
        assert!(receipt.transaction_id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_successful_payment_confirms_booking() {
        let fx = Fixture::new().await;
        let booking = pending_booking(&fx).await;
        let payments = orchestrator(&fx, Arc::new(SimulatedPaymentAdapter));

        let outcome = payments.pay(&fx.principal, booking.id, "upi").await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
        assert_eq!(outcome.booking.payment_status, PaymentStatus::Paid);
        assert_eq!(outcome.booking.payment_reference, outcome.transaction_id);

        // paying twice is rejected
        assert!(matches!(
            payments.pay(&fx.principal, booking.id, "upi").await.unwrap_err(),
            CoreError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn test_declined_payment_can_be_retried() {
        let fx = Fixture::new().await;
        let booking = pending_booking(&fx).await;
        let payments = orchestrator(&fx, Arc::new(SimulatedPaymentAdapter));

        let declined = payments.pay(&fx.principal, booking.id, "declined").await.unwrap();
        assert!(!declined.success);
        assert_eq!(declined.booking.status, BookingStatus::Pending);
        assert_eq!(declined.booking.payment_status, PaymentStatus::Failed);

        let retried = payments.pay(&fx.principal, booking.id, "card").await.unwrap();
        assert!(retried.success);
        assert_eq!(retried.booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_only_owner_pays() {
        let fx = Fixture::new().await;
        let booking = pending_booking(&fx).await;
        let payments = orchestrator(&fx, Arc::new(SimulatedPaymentAdapter));

        assert!(matches!(
            payments.pay(&Fixture::admin(), booking.id, "upi").await.unwrap_err(),
            CoreError::Forbidden(_)
        ));
        assert!(matches!(
            payments.pay(&fx.principal, Uuid::new_v4(), "upi").await.unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_provider_error_leaves_booking_untouched() {
        let fx = Fixture::new().await;
        let booking = pending_booking(&fx).await;
        let payments = orchestrator(&fx, Arc::new(BrokenAdapter));

        assert!(matches!(
            payments.pay(&fx.principal, booking.id, "upi").await.unwrap_err(),
            CoreError::InternalError(_)
        ));
        let stored = fx.store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_payments_charge_once() {
        let fx = Fixture::new().await;
        let booking = pending_booking(&fx).await;
        let adapter = Arc::new(SlowAdapter::default());
        let payments = orchestrator(&fx, adapter.clone());

        let (first, second) = tokio::join!(
            payments.pay(&fx.principal, booking.id, "upi"),
            payments.pay(&fx.principal, booking.id, "upi"),
        );

        assert_eq!(adapter.charges.load(Ordering::SeqCst), 1);
        let (ok, rejected) = if first.is_ok() { (first, second) } else { (second, first) };
        assert!(ok.unwrap().success);
        assert!(matches!(rejected.unwrap_err(), CoreError::Conflict(_)));

        let stored = fx.store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_extension_during_charge_is_kept() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(2)).await.unwrap();
        let payments = orchestrator(&fx, Arc::new(SlowAdapter::default()));
        let new_end = booking.end_time + chrono::Duration::minutes(30);

        let (paid, extended) = tokio::join!(
            payments.pay(&fx.principal, booking.id, "upi"),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let patch = BookingPatch { end_time: Some(new_end), ..Default::default() };
                manager.update(&fx.principal, booking.id, patch).await
            },
        );

        let extended = extended.unwrap();
        assert_eq!(extended.total_price, 125.0);
        assert!(paid.unwrap().success);

        let stored = fx.store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.end_time, new_end);
        assert_eq!(stored.total_price, 125.0);
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_cancel_during_charge_refunds() {
        let fx = Fixture::new().await;
        let manager = fx.default_manager(Arc::new(RecordingNotifier::default()));
        let booking = manager.create(&fx.principal, fx.request(2)).await.unwrap();
        let adapter = Arc::new(SlowAdapter::default());
        let payments = orchestrator(&fx, adapter.clone());

        let (paid, cancelled) = tokio::join!(
            payments.pay(&fx.principal, booking.id, "upi"),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let patch =
                    BookingPatch { status: Some(BookingStatus::Cancelled), ..Default::default() };
                manager.update(&fx.principal, booking.id, patch).await
            },
        );

        assert_eq!(cancelled.unwrap().status, BookingStatus::Cancelled);
        let outcome = paid.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.booking.status, BookingStatus::Cancelled);
        assert_eq!(outcome.booking.payment_status, PaymentStatus::Refunded);
        assert_eq!(adapter.charges.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.refunds.load(Ordering::SeqCst), 1);
        assert_eq!(fx.slot_status().await, SlotStatus::Available);
    }
}
