use std::sync::Arc;
use std::time::Duration;

use parkeasy_booking::{
    BookingManager, ConfirmationArtifacts, DetachedTasks, PaymentOrchestrator, PdfReceiptRenderer,
    QrCodeEncoder, SimulatedPaymentAdapter,
};
use parkeasy_catalog::{
    AccountService, LotService, PricingConfig, PricingEngine, ReviewService, SlotInventory,
};
use parkeasy_core::notify::Notifier;
use parkeasy_core::ParkingStore;
use parkeasy_store::app_config::BusinessRules;
use parkeasy_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub requests_per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ParkingStore>,
    pub bookings: Arc<BookingManager>,
    pub payments: Arc<PaymentOrchestrator>,
    pub lots: Arc<LotService>,
    pub inventory: Arc<SlotInventory>,
    pub reviews: Arc<ReviewService>,
    pub accounts: Arc<AccountService>,
    pub rate_limit: Option<RateLimit>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wire every service over one store and notifier.
    pub fn new(
        store: Arc<dyn ParkingStore>,
        notifier: Arc<dyn Notifier>,
        rules: &BusinessRules,
        auth: AuthConfig,
    ) -> Self {
        let inventory = Arc::new(SlotInventory::new(store.clone(), rules.max_bulk_slots));
        let artifacts = Arc::new(ConfirmationArtifacts::new(
            Arc::new(QrCodeEncoder::default()),
            Arc::new(PdfReceiptRenderer::new("ParkEasy", rules.currency.clone())),
        ));
        let tasks = DetachedTasks::new(Duration::from_secs(rules.side_effect_timeout_seconds));

        let bookings = BookingManager::new(
            store.clone(),
            inventory.clone(),
            artifacts,
            notifier,
            tasks,
            rules.currency.clone(),
        )
        .with_pricing(PricingEngine::new(PricingConfig {
            min_billable_hours: rules.min_billable_hours,
            ..Default::default()
        }));
        let payments = PaymentOrchestrator::new(
            store.clone(),
            Arc::new(SimulatedPaymentAdapter),
            rules.currency.clone(),
        );

        Self {
            bookings: Arc::new(bookings),
            payments: Arc::new(payments),
            lots: Arc::new(LotService::new(store.clone(), rules.default_search_radius_km)),
            inventory,
            reviews: Arc::new(ReviewService::new(store.clone())),
            accounts: Arc::new(AccountService::new(store.clone())),
            store,
            rate_limit: None,
            auth,
        }
    }

    pub fn with_rate_limit(mut self, redis: Arc<RedisClient>, requests_per_minute: i64) -> Self {
        self.rate_limit = Some(RateLimit { redis, requests_per_minute });
        self
    }
}
