//! Domain services

pub mod format;
pub mod jitter;
pub mod price_estimator;

pub use format::format_price;
pub use jitter::{FixedJitter, JitterSource, UniformJitter};
pub use price_estimator::{
    age_factor, base_price_for_label, condition_factor, estimate_adjusted_price,
    warranty_factor, PriceEstimator,
};
