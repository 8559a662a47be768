//! Resale price estimation
//!
//! price = base × condition × warranty × age × noise
//!
//! - condition: 1 + (condition - 3) / 10
//! - warranty:  1 + sqrt(warranty) / 10
//! - age:       1 - ln(1 + age) / ln(1 + 48)
//! - noise:     uniform in [0.95, 1.05)
//!
//! Inputs are not validated or clamped. Values outside the slider ranges can
//! produce zero or negative prices.

use crate::model::category::{find_category, DEFAULT_BASE_PRICE};
use crate::service::jitter::JitterSource;
use pricescout_types::{EstimationInput, PriceBreakdown};
use tracing::debug;

/// Condition value that leaves the price unchanged
pub const CONDITION_CENTER: f64 = 3.0;

/// Each condition step shifts the price by 1/10
pub const CONDITION_STEP_DIVISOR: f64 = 10.0;

/// Age at which the age factor reaches zero (slider maximum, months)
pub const AGE_NORMALIZATION_MONTHS: f64 = 48.0;

/// Base price for a classifier label, 100 when no category matches
pub fn base_price_for_label(label: &str) -> f64 {
    find_category(label)
        .map(|category| category.base_price)
        .unwrap_or(DEFAULT_BASE_PRICE)
}

pub fn condition_factor(condition: i32) -> f64 {
    1.0 + (f64::from(condition) - CONDITION_CENTER) / CONDITION_STEP_DIVISOR
}

pub fn warranty_factor(warranty_months: f64) -> f64 {
    1.0 + warranty_months.sqrt() / 10.0
}

pub fn age_factor(age_months: f64) -> f64 {
    1.0 - age_months.ln_1p() / AGE_NORMALIZATION_MONTHS.ln_1p()
}

/// Apply every factor to `base_price` and draw one noise sample
pub fn estimate_adjusted_price(
    base_price: f64,
    condition: i32,
    age_months: f64,
    warranty_months: f64,
    jitter: &mut dyn JitterSource,
) -> f64 {
    adjust(base_price, condition, age_months, warranty_months, jitter).adjusted_price
}

fn adjust(
    base_price: f64,
    condition: i32,
    age_months: f64,
    warranty_months: f64,
    jitter: &mut dyn JitterSource,
) -> PriceBreakdown {
    let condition_factor = condition_factor(condition);
    let warranty_factor = warranty_factor(warranty_months);
    let age_factor = age_factor(age_months);
    let noise = jitter.sample();

    PriceBreakdown {
        base_price,
        condition_factor,
        warranty_factor,
        age_factor,
        noise,
        adjusted_price: base_price * condition_factor * warranty_factor * age_factor * noise,
    }
}

/// Stateless estimator. Callers own the jitter source, so one estimator can
/// be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceEstimator;

impl PriceEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Look up the base price for `input.label` and apply the adjustments
    pub fn estimate(&self, input: &EstimationInput, jitter: &mut dyn JitterSource) -> PriceBreakdown {
        let base_price = base_price_for_label(&input.label);
        let breakdown = adjust(
            base_price,
            input.condition,
            input.age_months,
            input.warranty_months,
            jitter,
        );

        debug!(
            label = %input.label,
            base_price,
            condition = input.condition,
            age_months = input.age_months,
            warranty_months = input.warranty_months,
            adjusted_price = breakdown.adjusted_price,
            "price estimated"
        );

        breakdown
    }
}
