//! Domain model types

pub mod category;

pub use category::{PriceCategory, DEFAULT_BASE_PRICE, PRICE_CATEGORIES};
