use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Shortest duration ever billed, in hours
    pub min_billable_hours: f64,

    /// Maximum multiplier allowed
    pub max_multiplier: f64,

    /// Minimum multiplier allowed
    pub min_multiplier: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            min_billable_hours: 1.0,
            max_multiplier: 3.0,
            min_multiplier: 0.5,
        }
    }
}

/// Hourly parking price calculator
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Hours between start and end, floored at the minimum billable duration.
    pub fn billable_hours(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        let hours = (end - start).num_milliseconds() as f64 / 3_600_000.0;
        hours.max(self.config.min_billable_hours)
    }

    /// `round(rate * max(1, hours), 2)`
    pub fn calculate_price(&self, rate_per_hour: f64, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        self.calculate_with_multiplier(rate_per_hour, start, end, 1.0)
    }

    /// Same as `calculate_price` with a surge multiplier, clamped to the configured band.
    pub fn calculate_with_multiplier(
        &self,
        rate_per_hour: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        multiplier: f64,
    ) -> f64 {
        let multiplier = multiplier.clamp(self.config.min_multiplier, self.config.max_multiplier);
        round2(rate_per_hour * self.billable_hours(start, end) * multiplier)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
