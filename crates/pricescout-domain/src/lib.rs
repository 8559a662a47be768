//! Domain layer - price categories and the resale price estimator

pub mod model;
pub mod service;

pub use model::{PriceCategory, DEFAULT_BASE_PRICE, PRICE_CATEGORIES};
pub use service::format::DEFAULT_CURRENCY_SYMBOL;
pub use service::{
    age_factor, base_price_for_label, condition_factor, estimate_adjusted_price, format_price,
    warranty_factor, FixedJitter, JitterSource, PriceEstimator, UniformJitter,
};
